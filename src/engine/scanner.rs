/**
* filename : scanner
* author : HAMA
* date: 2025. 11. 7.
* description: 시장별 종목 일괄 분석 및 상위 종목 추출
**/

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::engine::analyzer::{AnalysisContext, Verdict};
use crate::market_data::Period;
use crate::models::symbol_book::Market;
use crate::utils::logging;

pub const SCAN_TOP_N: usize = 15;
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub name: String,
    pub ticker: String,
    pub score: f64,
    pub verdict: Verdict,
    pub current_price: f64,
    pub stop_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub market: Market,
    pub results: Vec<ScanEntry>,
    pub scanned: usize,
    pub failed: usize,
}

pub struct Scanner {
    context: AnalysisContext,
    period: Period,
    concurrency: usize,
}

impl Scanner {
    pub fn new(context: AnalysisContext) -> Self {
        Scanner {
            context,
            period: Period::SixMonths,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    /// universe: (종목명, 티커) 목록. 시장에 맞는 종목만 분석
    pub async fn scan(&self, market: Market, universe: &[(String, String)]) -> ScanReport {
        let targets: Vec<(String, String)> = universe
            .iter()
            .filter(|(_, ticker)| market.matches(ticker))
            .cloned()
            .collect();
        let scanned = targets.len();
        log::info!("스캔 시작: {:?} - {}개 종목", market, scanned);

        let period = self.period;
        let outcomes: Vec<Option<ScanEntry>> = stream::iter(targets)
            .map(|(name, ticker)| {
                let context = self.context.clone();
                async move {
                    let analyzer = match context.analyzer(&ticker) {
                        Ok(a) => a,
                        Err(e) => {
                            log::warn!("[{}] 스캔 제외: {}", ticker, e);
                            return None;
                        }
                    };
                    let result = analyzer.analyze(period, false).await;
                    match (result.success, result.verdict) {
                        (true, Some(verdict)) => Some(ScanEntry {
                            name,
                            ticker: result.ticker,
                            score: result.score,
                            verdict,
                            current_price: result.current_price,
                            stop_loss: result.stop_loss,
                        }),
                        _ => None,
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut results: Vec<ScanEntry> = outcomes.into_iter().flatten().collect();
        let failed = scanned - results.len();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(SCAN_TOP_N);

        logging::log_scan_done(market.as_str(), scanned, failed);
        ScanReport {
            market,
            results,
            scanned,
            failed,
        }
    }
}
