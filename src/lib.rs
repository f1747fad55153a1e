//! 주식 분석 터미널 라이브러리
//!
//! 이원화 시세 수집, 기술적 지표 채점, 시장 스캔, 포트폴리오 관리와 백테스팅을 지원합니다.

pub mod analysis;
pub mod api;
pub mod auth;
pub mod backtest;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod models;
pub mod portfolio;
pub mod utils;

// 핵심 타입 재노출
pub use crate::error::TerminalError;
pub use crate::engine::{AnalysisContext, AnalysisResult, StockAnalyzer};
pub use crate::models::{Bar, Holding, PriceHistory};

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, TerminalError>;
