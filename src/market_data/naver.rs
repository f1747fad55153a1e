/**
* filename : naver
* author : HAMA
* date: 2025. 11. 5.
* description: 네이버 금융 siseJson 제공자 (KOSPI/KOSDAQ, ETF/ETN 포함)
**/

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::error::TerminalError;
use crate::market_data::period::Period;
use crate::market_data::provider::MarketDataProvider;
use crate::market_data::retry::{get_with_retry, RetryPolicy};
use crate::models::market_data::{Bar, PriceHistory};

pub const DEFAULT_NAVER_BASE_URL: &str = "https://api.finance.naver.com";

/// 현재가 조회 시 요청하는 최근 일수
const LATEST_PRICE_LOOKBACK_DAYS: i64 = 7;

/// "005930.KS" -> "005930"
pub fn strip_market_suffix(ticker: &str) -> &str {
    ticker.split('.').next().unwrap_or(ticker)
}

fn number_at(row: &[Value], index: usize) -> Option<f64> {
    match row.get(index)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// siseJson 본문 파싱
///
/// 본문은 작은따옴표가 섞인 JS 배열이며 첫 행은 헤더다.
/// 각 행: [날짜(YYYYMMDD), 시가, 고가, 저가, 종가, 거래량, ...]
pub fn parse_sise_json(ticker: &str, body: &str) -> Result<PriceHistory, TerminalError> {
    let normalized = body.trim().replace('\'', "\"");
    let rows: Vec<Vec<Value>> = serde_json::from_str(&normalized)
        .map_err(|e| TerminalError::ParseError(format!("Invalid siseJson body for {}: {}", ticker, e)))?;

    let mut bars = Vec::with_capacity(rows.len().saturating_sub(1));
    for row in rows.iter().skip(1) {
        let date = match row.first().and_then(|v| v.as_str()) {
            Some(d) => d.trim(),
            None => continue,
        };
        let day = match NaiveDate::parse_from_str(date, "%Y%m%d") {
            Ok(day) => day,
            Err(_) => {
                log::debug!("[{}] 날짜 파싱 실패, 행 건너뜀: {}", ticker, date);
                continue;
            }
        };
        let timestamp = match day.and_hms_opt(0, 0, 0) {
            Some(dt) => dt.and_utc().timestamp_millis(),
            None => continue,
        };

        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            number_at(row, 1),
            number_at(row, 2),
            number_at(row, 3),
            number_at(row, 4),
            number_at(row, 5),
        ) {
            bars.push(Bar::new(timestamp, open, high, low, close, volume));
        }
    }

    Ok(PriceHistory::new(ticker, bars))
}

pub struct NaverProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NaverProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TerminalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .build()?;

        Ok(NaverProvider {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn sise_url(&self, code: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/siseJson.naver?symbol={}&requestType=1&startTime={}&endTime={}&timeframe=day",
            self.base_url,
            code,
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        )
    }

    async fn fetch_days(&self, ticker: &str, days: i64) -> Result<PriceHistory, TerminalError> {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(days);
        let url = self.sise_url(strip_market_suffix(ticker), start, end);
        log::debug!("네이버 시세 요청: {}", url);

        let body = get_with_retry(&self.client, &url, &self.retry).await?.text().await?;
        parse_sise_json(ticker, &body)
    }
}

#[async_trait]
impl MarketDataProvider for NaverProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        _adjusted: bool,
    ) -> Result<PriceHistory, TerminalError> {
        // 네이버 일봉은 수정주가 구분 없음
        self.fetch_days(ticker, period.days()).await
    }

    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>, TerminalError> {
        let history = self.fetch_days(ticker, LATEST_PRICE_LOOKBACK_DAYS).await?;
        Ok(history.last_close())
    }
}
