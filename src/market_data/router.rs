/**
* filename : router
* author : HAMA
* date: 2025. 11. 5.
* description: 이원화 데이터 라우팅 (국내 -> 네이버, 해외/코인 -> Yahoo)
**/

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TerminalError;
use crate::market_data::period::Period;
use crate::market_data::provider::MarketDataProvider;
use crate::models::market_data::{is_korean_ticker, PriceHistory};

pub struct DualSourceRouter {
    global: Arc<dyn MarketDataProvider>,
    korea: Arc<dyn MarketDataProvider>,
}

impl DualSourceRouter {
    pub fn new(global: Arc<dyn MarketDataProvider>, korea: Arc<dyn MarketDataProvider>) -> Self {
        DualSourceRouter { global, korea }
    }
}

#[async_trait]
impl MarketDataProvider for DualSourceRouter {
    /// Yahoo 우선, 국내 종목은 실패 시 네이버로 대체
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<PriceHistory, TerminalError> {
        match self.global.fetch_history(ticker, period, adjusted).await {
            Ok(history) => Ok(history),
            Err(e) if is_korean_ticker(ticker) => {
                log::warn!("[{}] Yahoo 히스토리 실패, 네이버로 대체: {}", ticker, e);
                self.korea.fetch_history(ticker, period, adjusted).await
            }
            Err(e) => Err(e),
        }
    }

    /// 제공자 오류는 로그만 남기고 None
    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>, TerminalError> {
        let provider = if is_korean_ticker(ticker) { &self.korea } else { &self.global };

        match provider.latest_price(ticker).await {
            Ok(price) => Ok(price.filter(|p| p.is_finite() && *p > 0.0)),
            Err(e) => {
                log::error!("[{}] 현재가 수신 오류: {}", ticker, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::provider::MockMarketDataProvider;
    use crate::models::market_data::Bar;

    fn one_bar(ticker: &str) -> PriceHistory {
        PriceHistory::new(ticker, vec![Bar::new(0, 1.0, 1.0, 1.0, 1.0, 1.0)])
    }

    #[tokio::test]
    async fn test_korean_price_goes_to_korea_provider() {
        let mut global = MockMarketDataProvider::new();
        global.expect_latest_price().never();
        let mut korea = MockMarketDataProvider::new();
        korea.expect_latest_price().returning(|_| Ok(Some(71000.0)));

        let router = DualSourceRouter::new(Arc::new(global), Arc::new(korea));
        assert_eq!(router.latest_price("005930.KS").await.unwrap(), Some(71000.0));
    }

    #[tokio::test]
    async fn test_price_error_becomes_none() {
        let mut global = MockMarketDataProvider::new();
        global
            .expect_latest_price()
            .returning(|_| Err(TerminalError::DataFetch("timeout".to_string())));
        let korea = MockMarketDataProvider::new();

        let router = DualSourceRouter::new(Arc::new(global), Arc::new(korea));
        assert_eq!(router.latest_price("AAPL").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_history_falls_back_to_korea_for_korean_ticker() {
        let mut global = MockMarketDataProvider::new();
        global
            .expect_fetch_history()
            .returning(|_, _, _| Err(TerminalError::DataFetch("404".to_string())));
        let mut korea = MockMarketDataProvider::new();
        korea
            .expect_fetch_history()
            .times(1)
            .returning(|t, _, _| Ok(one_bar(t)));

        let router = DualSourceRouter::new(Arc::new(global), Arc::new(korea));
        let history = router.fetch_history("005930.KS", Period::SixMonths, false).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_history_error_kept_for_global_ticker() {
        let mut global = MockMarketDataProvider::new();
        global
            .expect_fetch_history()
            .returning(|_, _, _| Err(TerminalError::DataFetch("404".to_string())));
        let mut korea = MockMarketDataProvider::new();
        korea.expect_fetch_history().never();

        let router = DualSourceRouter::new(Arc::new(global), Arc::new(korea));
        assert!(router.fetch_history("AAPL", Period::SixMonths, false).await.is_err());
    }
}
