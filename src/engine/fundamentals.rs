/**
* filename : fundamentals
* author : HAMA
* date: 2025. 11. 6.
* description: 재무제표 검증 (시가총액 / EPS / 부채비율 감점)
**/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TerminalError;
use crate::market_data::retry::{get_with_retry, RetryPolicy};
use crate::models::market_data::is_korean_ticker;

const EXEMPT_QUOTE_TYPES: &[&str] = &["ETF", "MUTUALFUND", "CRYPTOCURRENCY"];
const FINANCIAL_KEYWORDS: &[&str] = &["bank", "financial", "insurance"];

/// 국내 300억원, 해외 $200M 미만이면 소형주
const KR_MIN_MARKET_CAP: f64 = 30_000_000_000.0;
const GLOBAL_MIN_MARKET_CAP: f64 = 200_000_000.0;

const SMALL_CAP_PENALTY: f64 = 25.0;
const NEGATIVE_EPS_PENALTY: f64 = 20.0;
const HIGH_DEBT_PENALTY: f64 = 10.0;

/// 종목 기본 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerProfile {
    pub ticker: String,
    pub quote_type: String,
    pub short_name: String,
    pub market_cap: f64,
    pub trailing_eps: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub industry: String,
    pub sector: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsResult {
    pub penalty: f64,
    pub messages: Vec<String>,
    pub is_exempt: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn profile(&self, ticker: &str) -> Result<TickerProfile, TerminalError>;
}

/// Yahoo quoteSummary 기반 프로필
pub struct YahooFundamentals {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl YahooFundamentals {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TerminalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .build()?;

        Ok(YahooFundamentals {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }
}

fn raw_number(module: &Value, field: &str) -> Option<f64> {
    let node = module.get(field)?;
    node.get("raw").and_then(Value::as_f64).or_else(|| node.as_f64())
}

fn text(module: &Value, field: &str) -> String {
    module.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// quoteSummary 응답 -> TickerProfile
pub fn parse_quote_summary(ticker: &str, body: &str) -> Result<TickerProfile, TerminalError> {
    let root: Value = serde_json::from_str(body)?;
    let result = root
        .pointer("/quoteSummary/result/0")
        .ok_or_else(|| TerminalError::DataFetch(format!("No quoteSummary result for {}", ticker)))?;

    let null = Value::Null;
    let price = result.get("price").unwrap_or(&null);
    let stats = result.get("defaultKeyStatistics").unwrap_or(&null);
    let financial = result.get("financialData").unwrap_or(&null);
    let profile = result.get("assetProfile").unwrap_or(&null);

    Ok(TickerProfile {
        ticker: ticker.to_uppercase(),
        quote_type: text(price, "quoteType"),
        short_name: text(price, "shortName"),
        market_cap: raw_number(price, "marketCap").unwrap_or(0.0),
        trailing_eps: raw_number(stats, "trailingEps"),
        revenue_growth: raw_number(financial, "revenueGrowth"),
        debt_to_equity: raw_number(financial, "debtToEquity"),
        industry: text(profile, "industry"),
        sector: text(profile, "sector"),
    })
}

#[async_trait]
impl FundamentalsSource for YahooFundamentals {
    async fn profile(&self, ticker: &str) -> Result<TickerProfile, TerminalError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules=price,defaultKeyStatistics,financialData,assetProfile",
            self.base_url, ticker
        );
        let body = get_with_retry(&self.client, &url, &self.retry).await?.text().await?;
        parse_quote_summary(ticker, &body)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalsChecker;

impl FundamentalsChecker {
    pub fn new() -> Self {
        FundamentalsChecker
    }

    /// 프로필 조회 실패는 감점 없이 메시지만 남김
    pub async fn check(&self, source: &dyn FundamentalsSource, ticker: &str) -> FundamentalsResult {
        match source.profile(ticker).await {
            Ok(profile) => self.evaluate(&profile),
            Err(e) => {
                log::warn!("[{}] 재무 데이터 수신 불가: {}", ticker, e);
                FundamentalsResult {
                    penalty: 0.0,
                    messages: vec!["재무 데이터 수신 불가 (정보 누락)".to_string()],
                    is_exempt: false,
                }
            }
        }
    }

    pub fn evaluate(&self, profile: &TickerProfile) -> FundamentalsResult {
        if EXEMPT_QUOTE_TYPES.contains(&profile.quote_type.as_str()) || profile.short_name.contains("ETF") {
            return FundamentalsResult {
                penalty: 0.0,
                messages: vec!["ETF/펀드/암호화폐 - 재무 검증 면제".to_string()],
                is_exempt: true,
            };
        }

        let mut penalty: f64 = 0.0;
        let mut messages = Vec::new();

        let market_cap = profile.market_cap;
        if market_cap > 0.0 {
            if is_korean_ticker(&profile.ticker) {
                if market_cap < KR_MIN_MARKET_CAP {
                    penalty += SMALL_CAP_PENALTY;
                    messages.push(format!("시가총액 {:.0}억원 - 300억 미달 (-25점)", market_cap / 1e8));
                }
            } else if market_cap < GLOBAL_MIN_MARKET_CAP {
                penalty += SMALL_CAP_PENALTY;
                messages.push(format!("시가총액 ${:.0}M - $200M 미달 (-25점)", market_cap / 1e6));
            }
        }

        if let Some(eps) = profile.trailing_eps {
            if eps < 0.0 {
                let growth = profile.revenue_growth.unwrap_or(0.0);
                if growth > 0.20 {
                    messages.push(format!("성장주 예외 - 매출성장 {:.0}% EPS 감점 면제", growth * 100.0));
                } else {
                    penalty += NEGATIVE_EPS_PENALTY;
                    messages.push("지속 적자 (EPS<0) - -20점".to_string());
                }
            }
        }

        if let Some(debt_to_equity) = profile.debt_to_equity {
            if debt_to_equity > 200.0 {
                let industry = profile.industry.to_lowercase();
                let sector = profile.sector.to_lowercase();
                let is_financial = FINANCIAL_KEYWORDS
                    .iter()
                    .any(|kw| industry.contains(kw) || sector.contains(kw));

                if is_financial {
                    messages.push("금융업종 - 부채비율 감점 면제".to_string());
                } else {
                    penalty += HIGH_DEBT_PENALTY;
                    messages.push("부채비율 200% 초과 - -10점".to_string());
                }
            }
        }

        if penalty == 0.0 && messages.is_empty() {
            messages.push("펀더멘털 양호".to_string());
        }

        FundamentalsResult {
            penalty,
            messages,
            is_exempt: false,
        }
    }
}
