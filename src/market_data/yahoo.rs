/**
* filename : yahoo
* author : HAMA
* date: 2025. 11. 5.
* description: Yahoo Finance chart API 제공자 (해외/코인)
**/

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::error::TerminalError;
use crate::market_data::period::Period;
use crate::market_data::provider::MarketDataProvider;
use crate::market_data::retry::{get_with_retry, RetryPolicy};
use crate::models::market_data::{Bar, PriceHistory};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    adjclose: Option<Vec<Option<f64>>>,
}

/// chart 응답 파싱 결과 (히스토리 + 메타 현재가)
#[derive(Debug, Clone)]
pub struct ChartData {
    pub history: PriceHistory,
    pub regular_market_price: Option<f64>,
}

fn column_value(column: &Option<Vec<Option<f64>>>, index: usize) -> Option<f64> {
    column.as_ref().and_then(|values| values.get(index).copied().flatten())
}

/// chart JSON 파싱. null 필드가 있는 행은 버림
///
/// adjusted 이면 수정종가 비율로 OHLC 를 보정한다.
pub fn parse_chart(ticker: &str, body: &str, adjusted: bool) -> Result<ChartData, TerminalError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| TerminalError::ParseError(format!("Invalid chart response for {}: {}", ticker, e)))?;

    if let Some(err) = envelope.chart.error {
        return Err(TerminalError::DataFetch(format!(
            "{}: {} {}",
            ticker,
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
        .ok_or_else(|| TerminalError::DataFetch(format!("No chart result for {}", ticker)))?;

    let regular_market_price = result.meta.and_then(|m| m.regular_market_price);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| TerminalError::ParseError(format!("Missing quote columns for {}", ticker)))?;
    let adjclose = result
        .indicators
        .adjclose
        .and_then(|cols| cols.into_iter().next())
        .and_then(|col| col.adjclose);

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let row = (
            column_value(&quote.open, i),
            column_value(&quote.high, i),
            column_value(&quote.low, i),
            column_value(&quote.close, i),
            column_value(&quote.volume, i),
        );
        let (open, high, low, close, volume) = match row {
            (Some(o), Some(h), Some(l), Some(c), Some(v)) => (o, h, l, c, v),
            _ => continue,
        };

        let factor = match (adjusted, adjclose.as_ref().and_then(|a| a.get(i).copied().flatten())) {
            (true, Some(adj)) if close != 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(Bar::new(ts * 1000, open * factor, high * factor, low * factor, close * factor, volume));
    }

    Ok(ChartData {
        history: PriceHistory::new(ticker, bars),
        regular_market_price,
    })
}

pub struct YahooProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YahooProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TerminalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(YahooProvider {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn chart_url(&self, ticker: &str, period: Period, adjusted: bool) -> String {
        let window = match period.yahoo_range() {
            Some(range) => format!("range={}", range),
            None => {
                let end = Utc::now().timestamp();
                let start = end - period.days() * 86_400;
                format!("period1={}&period2={}", start, end)
            }
        };
        let mut url = format!(
            "{}/v8/finance/chart/{}?{}&interval=1d&events=history",
            self.base_url, ticker, window
        );
        if adjusted {
            url.push_str("&includeAdjustedClose=true");
        }
        url
    }

    async fn fetch_chart(&self, ticker: &str, period: Period, adjusted: bool) -> Result<ChartData, TerminalError> {
        let url = self.chart_url(ticker, period, adjusted);
        log::debug!("Yahoo 차트 요청: {}", url);
        let body = get_with_retry(&self.client, &url, &self.retry).await?.text().await?;
        parse_chart(ticker, &body, adjusted)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        adjusted: bool,
    ) -> Result<PriceHistory, TerminalError> {
        Ok(self.fetch_chart(ticker, period, adjusted).await?.history)
    }

    async fn latest_price(&self, ticker: &str) -> Result<Option<f64>, TerminalError> {
        let chart = self.fetch_chart(ticker, Period::OneDay, false).await?;
        Ok(chart
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| chart.history.last_close()))
    }
}
