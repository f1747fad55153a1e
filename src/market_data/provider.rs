use async_trait::async_trait;

use crate::error::TerminalError;
use crate::market_data::period::Period;
use crate::models::market_data::PriceHistory;

/// 시장 데이터 제공자 인터페이스
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 일봉 히스토리 조회 (adjusted = 수정주가)
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<PriceHistory, TerminalError>;

    /// 현재가 조회. 시세가 없으면 None
    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>, TerminalError>;
}
