//! 시장 데이터 수집 계층
//!
//! Yahoo(해외/코인) + 네이버(국내) 이원화 제공자, 재시도, TTL 캐시

pub mod cache;
pub mod client;
pub mod naver;
pub mod period;
pub mod provider;
pub mod retry;
pub mod router;
pub mod yahoo;

pub use cache::TtlCache;
pub use client::{DataClient, MIN_ROWS};
pub use naver::NaverProvider;
pub use period::Period;
pub use provider::MarketDataProvider;
pub use retry::RetryPolicy;
pub use router::DualSourceRouter;
pub use yahoo::YahooProvider;
