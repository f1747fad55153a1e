//! 분석 엔진
//!
//! 지표 계산, 채점, 재무 검증, 종목 분석, 시장 스캔

pub mod analyzer;
pub mod fundamentals;
pub mod indicator_engine;
pub mod report;
pub mod scanner;
pub mod scoring;

pub use analyzer::{
    dynamic_stop, is_rsi_hook_failed, is_waterfall, Action, AnalysisContext, AnalysisResult, FilterFlags,
    StockAnalyzer, Strategy, Verdict,
};
pub use fundamentals::{FundamentalsChecker, FundamentalsResult, FundamentalsSource, TickerProfile, YahooFundamentals};
pub use indicator_engine::{IndicatorEngine, IndicatorFrame, IndicatorSnapshot};
pub use report::DetailCard;
pub use scanner::{ScanEntry, ScanReport, Scanner};
pub use scoring::{calculate_sharp_score, calculate_trend_score, ScoreBreakdown, ScoreInputs};
