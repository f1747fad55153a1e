/**
* filename : client
* author : HAMA
* date: 2025. 11. 5.
* description: 분석용 데이터 수집기 (기간/수정주가 재시도, 정제, 캐시)
**/

use std::sync::Arc;
use std::time::Duration;

use crate::error::TerminalError;
use crate::market_data::cache::TtlCache;
use crate::market_data::period::Period;
use crate::market_data::provider::MarketDataProvider;
use crate::models::market_data::{Bar, PriceHistory};

/// 분석에 필요한 최소 봉 개수
pub const MIN_ROWS: usize = 30;

pub struct DataClient {
    provider: Arc<dyn MarketDataProvider>,
    histories: TtlCache<(String, Period), PriceHistory>,
    prices: TtlCache<String, f64>,
}

impl DataClient {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache_ttl: Duration) -> Self {
        DataClient {
            provider,
            histories: TtlCache::new(cache_ttl),
            prices: TtlCache::new(cache_ttl),
        }
    }

    pub fn provider(&self) -> Arc<dyn MarketDataProvider> {
        self.provider.clone()
    }

    /// 히스토리/현재가 캐시의 만료 항목 제거, 제거 개수 반환
    pub async fn purge_expired(&self) -> usize {
        self.histories.purge_expired().await + self.prices.purge_expired().await
    }

    /// 캐시에 남아 있는 항목 수 (히스토리 + 현재가)
    pub async fn cached_entries(&self) -> usize {
        self.histories.len().await + self.prices.len().await
    }

    /// 정제된 일봉 히스토리
    ///
    /// 요청 기간, 1y, 2y 순서로 각각 원주가/수정주가를 시도해 MIN_ROWS 이상인 첫 결과를 쓴다.
    /// 모든 시도가 전송 오류면 `DataFetch`, 응답은 있었지만 행이 모자라면 `InsufficientData`.
    pub async fn fetch(&self, ticker: &str, period: Period) -> Result<PriceHistory, TerminalError> {
        let key = (ticker.to_string(), period);
        if let Some(history) = self.histories.get(&key).await {
            log::debug!("[{}] 히스토리 캐시 적중 ({})", ticker, period);
            return Ok(history);
        }

        let mut last_error: Option<TerminalError> = None;
        let mut received_any = false;
        let mut best_rows = 0;

        for candidate in period.fallbacks() {
            for adjusted in [false, true] {
                match self.provider.fetch_history(ticker, candidate, adjusted).await {
                    Ok(history) if history.len() >= MIN_ROWS => {
                        let cleaned = clean_history(history)?;
                        self.histories.insert(key, cleaned.clone()).await;
                        return Ok(cleaned);
                    }
                    Ok(history) => {
                        received_any = true;
                        best_rows = best_rows.max(history.len());
                        log::debug!("[{}] {} (수정주가={}) {}행, 재시도", ticker, candidate, adjusted, history.len());
                    }
                    Err(e) => {
                        log::warn!("[{}] {} 수집 실패: {}", ticker, candidate, e);
                        last_error = Some(e);
                    }
                }
            }
        }

        if received_any {
            return Err(TerminalError::InsufficientData(format!(
                "{}: {} rows available, at least {} required",
                ticker, best_rows, MIN_ROWS
            )));
        }

        Err(TerminalError::DataFetch(match last_error {
            Some(e) => format!("{}: {}", ticker, e),
            None => format!("{}: no response", ticker),
        }))
    }

    /// 현재가 (캐시 우선)
    pub async fn latest_price(&self, ticker: &str) -> Option<f64> {
        let key = ticker.to_string();
        if let Some(price) = self.prices.get(&key).await {
            return Some(price);
        }

        match self.provider.latest_price(ticker).await {
            Ok(Some(price)) if price.is_finite() && price > 0.0 => {
                self.prices.insert(key, price).await;
                Some(price)
            }
            Ok(_) => None,
            Err(e) => {
                log::error!("[{}] 현재가 조회 실패: {}", ticker, e);
                None
            }
        }
    }
}

fn fill(value: f64, previous: Option<f64>) -> f64 {
    if value.is_finite() {
        value
    } else {
        previous.unwrap_or(f64::NAN)
    }
}

/// 결측치 전방 채움, 선두 결측 행 제거, 거래량 0 -> 1
pub fn clean_history(history: PriceHistory) -> Result<PriceHistory, TerminalError> {
    let ticker = history.ticker;
    let mut cleaned: Vec<Bar> = Vec::with_capacity(history.bars.len());
    let mut previous: Option<Bar> = None;

    for bar in history.bars {
        let filled = Bar {
            timestamp: bar.timestamp,
            open: fill(bar.open, previous.map(|p| p.open)),
            high: fill(bar.high, previous.map(|p| p.high)),
            low: fill(bar.low, previous.map(|p| p.low)),
            close: fill(bar.close, previous.map(|p| p.close)),
            volume: fill(bar.volume, previous.map(|p| p.volume)),
        };
        previous = Some(filled);

        if filled.is_finite() {
            cleaned.push(filled);
        }
    }

    if cleaned.is_empty() {
        return Err(TerminalError::InsufficientData(format!(
            "{}: no usable rows after forward fill",
            ticker
        )));
    }

    for bar in cleaned.iter_mut() {
        if bar.volume == 0.0 {
            bar.volume = 1.0;
        }
    }

    Ok(PriceHistory::new(ticker, cleaned))
}
