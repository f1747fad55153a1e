/**
* filename : pattern
* author : HAMA
* date: 2025. 11. 9.
* description: 최근 N일 차트와 가장 닮은 과거 구간 탐색 및 이후 수익률 집계
**/

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::TerminalError;
use crate::market_data::{DataClient, Period};
use crate::models::market_data::PriceHistory;
use crate::utils::format_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternParams {
    pub lookback: usize,
    pub horizons: Vec<usize>,
    pub top_n: usize,
}

impl Default for PatternParams {
    fn default() -> Self {
        PatternParams {
            lookback: 20,
            horizons: vec![20, 60],
            top_n: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonReturn {
    pub days: usize,
    pub return_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub index: usize,
    pub start_date: String,
    pub end_date: String,
    pub similarity: f64,
    pub returns: Vec<HorizonReturn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub ticker: String,
    pub average_returns: Vec<HorizonReturn>,
    pub matches: Vec<PatternMatch>,
}

const DATE_FORMAT: &str = "%y.%m.%d";

// z-score, 표준편차 0이면 None
fn normalize(window: &[f64]) -> Option<Vec<f64>> {
    let mean = window.iter().mean();
    let std = window.iter().population_std_dev();
    if !std.is_finite() || std == 0.0 {
        return None;
    }
    Some(window.iter().map(|v| (v - mean) / std).collect())
}

/// 정규화된 두 구간의 피어슨 상관계수
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>() / a.len() as f64
}

pub fn find_similar_patterns(history: &PriceHistory, params: &PatternParams) -> Result<PatternSummary, TerminalError> {
    let lookback = params.lookback;
    if lookback < 2 || params.horizons.is_empty() || params.top_n == 0 {
        return Err(TerminalError::InvalidParameter(format!("Invalid pattern parameters: {:?}", params)));
    }

    let closes = history.closes();
    if closes.len() < lookback * 3 {
        return Err(TerminalError::InsufficientData(format!(
            "{}: {} bars, need at least {}",
            history.ticker,
            closes.len(),
            lookback * 3
        )));
    }

    let current = normalize(&closes[closes.len() - lookback..]).ok_or_else(|| {
        TerminalError::Analysis(format!("{}: recent prices have zero volatility", history.ticker))
    })?;

    let max_horizon = params.horizons.iter().copied().fold(0, usize::max);
    let scan_limit = closes.len().saturating_sub(lookback + max_horizon);

    let mut candidates: Vec<PatternMatch> = (0..scan_limit)
        .filter_map(|i| {
            let window = normalize(&closes[i..i + lookback])?;
            let similarity = pearson(&current, &window) * 100.0;
            if !similarity.is_finite() {
                return None;
            }

            let end = i + lookback - 1;
            let base = closes[end];
            let returns = params
                .horizons
                .iter()
                .map(|&days| HorizonReturn {
                    days,
                    return_pct: (closes[end + days] - base) / base * 100.0,
                })
                .collect();

            Some(PatternMatch {
                index: i,
                start_date: format_timestamp(history.bars[i].timestamp, DATE_FORMAT),
                end_date: format_timestamp(history.bars[end].timestamp, DATE_FORMAT),
                similarity,
                returns,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));

    // 이미 고른 구간과 lookback 이내로 겹치면 제외
    let mut matches: Vec<PatternMatch> = Vec::with_capacity(params.top_n);
    for candidate in candidates {
        let overlaps = matches.iter().any(|m| m.index.abs_diff(candidate.index) < lookback);
        if !overlaps {
            matches.push(candidate);
        }
        if matches.len() >= params.top_n {
            break;
        }
    }

    if matches.is_empty() {
        return Err(TerminalError::Analysis(format!("{}: no similar pattern found", history.ticker)));
    }

    let average_returns = params
        .horizons
        .iter()
        .enumerate()
        .map(|(h, &days)| HorizonReturn {
            days,
            return_pct: matches.iter().map(|m| m.returns[h].return_pct).mean(),
        })
        .collect();

    Ok(PatternSummary {
        ticker: history.ticker.clone(),
        average_returns,
        matches,
    })
}

/// 3년치 일봉으로 패턴 탐색
pub struct PatternFinder {
    data: Arc<DataClient>,
    params: PatternParams,
}

impl PatternFinder {
    pub fn new(data: Arc<DataClient>) -> Self {
        PatternFinder {
            data,
            params: PatternParams::default(),
        }
    }

    pub fn with_params(mut self, params: PatternParams) -> Self {
        self.params = params;
        self
    }

    pub async fn find(&self, ticker: &str) -> Result<PatternSummary, TerminalError> {
        let ticker = ticker.trim().to_uppercase();
        let history = self.data.fetch(&ticker, Period::ThreeYears).await?;
        let summary = find_similar_patterns(&history, &self.params)?;
        log::info!("[{}] 유사 패턴 {}건 발견", ticker, summary.matches.len());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::market_data::Bar;

    const DAY_MS: i64 = 86_400_000;

    fn history_from(closes: &[f64]) -> PriceHistory {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(1_600_000_000_000 + i as i64 * DAY_MS, c, c, c, c, 1000.0))
            .collect();
        PriceHistory::new("TEST", bars)
    }

    // 주기 40 삼각파 + 완만한 상승
    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let phase = (i % 40) as f64;
                let tri = if phase < 20.0 { phase } else { 40.0 - phase };
                100.0 + tri + i as f64 * 0.01
            })
            .collect()
    }

    #[test]
    fn test_needs_three_lookbacks() {
        let history = history_from(&wave(59));
        assert!(matches!(
            find_similar_patterns(&history, &PatternParams::default()),
            Err(TerminalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_flat_recent_window_is_error() {
        let mut closes = wave(200);
        for c in closes.iter_mut().skip(180) {
            *c = 50.0;
        }
        let history = history_from(&closes);
        assert!(matches!(
            find_similar_patterns(&history, &PatternParams::default()),
            Err(TerminalError::Analysis(_))
        ));
    }

    #[test]
    fn test_periodic_series_finds_matching_phase() {
        let history = history_from(&wave(300));
        let summary = find_similar_patterns(&history, &PatternParams::default()).unwrap();

        assert_eq!(summary.matches.len(), 3);
        let best = &summary.matches[0];
        assert!(best.similarity > 99.0);
        // 상승 구간과 같은 위상 (280 % 40 == 0)
        assert!(best.index % 40 <= 1);
        assert_eq!(summary.average_returns.len(), 2);
        assert_eq!(summary.average_returns[0].days, 20);
    }

    #[test]
    fn test_selected_windows_do_not_overlap() {
        let history = history_from(&wave(400));
        let params = PatternParams {
            top_n: 5,
            ..PatternParams::default()
        };
        let summary = find_similar_patterns(&history, &params).unwrap();

        for (i, a) in summary.matches.iter().enumerate() {
            for b in summary.matches.iter().skip(i + 1) {
                assert!(a.index.abs_diff(b.index) >= params.lookback);
            }
        }
        let similarities: Vec<f64> = summary.matches.iter().map(|m| m.similarity).collect();
        assert!(similarities.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_match_dates_formatted() {
        let history = history_from(&wave(300));
        let summary = find_similar_patterns(&history, &PatternParams::default()).unwrap();
        assert_eq!(summary.matches[0].start_date.len(), "20.09.13".len());
    }
}
