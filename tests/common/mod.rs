#![allow(dead_code)]

/**
* filename : common
* author : HAMA
* date: 2025. 11. 10.
* description: 통합 테스트용 가짜 시세/재무 제공자
**/

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use wallst_pro::engine::{AnalysisContext, FundamentalsSource, TickerProfile};
use wallst_pro::market_data::{DataClient, MarketDataProvider, Period};
use wallst_pro::models::{Bar, PriceHistory};
use wallst_pro::TerminalError;

pub const DAY_MS: i64 = 86_400_000;
const START_MS: i64 = 1_600_000_000_000;

/// 종가 목록으로 일봉 히스토리 생성 (고가/저가 ±1%)
pub fn history_from(ticker: &str, closes: &[f64]) -> PriceHistory {
  let bars = closes
    .iter()
    .enumerate()
    .map(|(i, &c)| Bar::new(START_MS + i as i64 * DAY_MS, c, c * 1.01, c * 0.99, c, 10_000.0 + i as f64))
    .collect();
  PriceHistory::new(ticker, bars)
}

/// 완만한 상승 추세 + 사인파
pub fn wave(len: usize, base: f64) -> Vec<f64> {
  (0..len)
    .map(|i| base + i as f64 * 0.05 + (i as f64 / 6.0).sin() * base * 0.05)
    .collect()
}

/// 긴 하락 추세
pub fn decline(len: usize, base: f64) -> Vec<f64> {
  (0..len).map(|i| base * (1.0 - 0.004 * i as f64)).collect()
}

/// 메모리 시세 제공자. 등록되지 않은 티커는 DataFetch 오류
#[derive(Default)]
pub struct FakeProvider {
  histories: HashMap<String, PriceHistory>,
  prices: HashMap<String, f64>,
}

impl FakeProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_history(mut self, ticker: &str, closes: &[f64]) -> Self {
    self.histories.insert(ticker.to_string(), history_from(ticker, closes));
    self
  }

  pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
    self.prices.insert(ticker.to_string(), price);
    self
  }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
  async fn fetch_history(&self, ticker: &str, _period: Period, _adjusted: bool) -> Result<PriceHistory, TerminalError> {
    self
      .histories
      .get(ticker)
      .cloned()
      .ok_or_else(|| TerminalError::DataFetch(format!("{}: unknown ticker", ticker)))
  }

  async fn latest_price(&self, ticker: &str) -> Result<Option<f64>, TerminalError> {
    Ok(self.prices.get(ticker).copied())
  }
}

/// 고정 프로필 재무 소스
pub struct FakeFundamentals {
  pub profile: TickerProfile,
}

#[async_trait]
impl FundamentalsSource for FakeFundamentals {
  async fn profile(&self, ticker: &str) -> Result<TickerProfile, TerminalError> {
    Ok(TickerProfile {
      ticker: ticker.to_string(),
      ..self.profile.clone()
    })
  }
}

pub fn data_client(provider: FakeProvider) -> Arc<DataClient> {
  Arc::new(DataClient::new(Arc::new(provider), Duration::from_secs(60)))
}

pub fn context(provider: FakeProvider) -> AnalysisContext {
  AnalysisContext::new(data_client(provider), None)
}
