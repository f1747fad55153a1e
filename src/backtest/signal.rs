/**
* filename : signal
* author : HAMA
* date: 2025. 11. 9.
* description: 일별 역추세 점수로 진입, N일 보유 후 청산하는 시그널 백테스트
**/

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::backtest::data_provider::HistoricalDataProvider;
use crate::engine::scoring::{calculate_sharp_score, round1, round2, ScoreInputs};
use crate::error::TerminalError;
use crate::indicators::{indicator_series, BollingerBands, MoneyFlowIndex, RelativeStrengthIndex, MACD};
use crate::models::market_data::PriceHistory;
use crate::utils::format_timestamp;

pub const MIN_BACKTEST_BARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBacktestParams {
    pub threshold: f64,
    pub hold_days: usize,
}

impl Default for SignalBacktestParams {
    fn default() -> Self {
        SignalBacktestParams {
            threshold: 80.0,
            hold_days: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTrade {
    pub entry_date: String,
    pub exit_date: String,
    pub score: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub return_pct: f64,
    pub max_return_pct: f64,
    pub win: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBacktestReport {
    pub ticker: String,
    pub params: SignalBacktestParams,
    pub signals: usize,
    pub skipped: usize,
    pub trades: Vec<SignalTrade>,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub average_return: f64,
    pub return_std_dev: f64,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

// 지표 워밍업 이후 봉 (인덱스, 점수)
fn daily_scores(history: &PriceHistory) -> Result<Vec<(usize, f64)>, TerminalError> {
    let bars = &history.bars;
    let rsi = indicator_series(&mut RelativeStrengthIndex::new(14, None, None), bars)?;
    let mfi = indicator_series(&mut MoneyFlowIndex::new(14), bars)?;
    let bb_lower = indicator_series(&mut BollingerBands::new(20, 2.0), bars)?;
    let macd_diff = indicator_series(&mut MACD::new(12, 26, 9), bars)?;

    let scores = (0..bars.len())
        .filter_map(|i| {
            let inputs = ScoreInputs {
                rsi: rsi[i]?,
                mfi: mfi[i]?,
                bb_lower: bb_lower[i]?,
                price: bars[i].close,
                macd_diff: macd_diff[i]?,
                ..ScoreInputs::default()
            };
            Some((i, calculate_sharp_score(&inputs)))
        })
        .collect();
    Ok(scores)
}

/// 점수가 threshold 이상인 날 종가 진입, hold_days 뒤 종가 청산.
/// 청산일이 데이터 범위를 벗어나는 최근 시그널은 건너뛴다.
pub fn run_signal_backtest(
    history: &PriceHistory,
    params: SignalBacktestParams,
) -> Result<SignalBacktestReport, TerminalError> {
    if params.hold_days == 0 {
        return Err(TerminalError::InvalidParameter("hold_days must be positive".to_string()));
    }
    if history.len() < MIN_BACKTEST_BARS {
        return Err(TerminalError::InsufficientData(format!(
            "{}: {} bars, need at least {}",
            history.ticker,
            history.len(),
            MIN_BACKTEST_BARS
        )));
    }

    let scored = daily_scores(history)?;
    let bars = &history.bars;

    let mut trades = Vec::new();
    let mut signals = 0;
    let mut skipped = 0;

    for (pos, &(idx, score)) in scored.iter().enumerate() {
        if score < params.threshold {
            continue;
        }
        signals += 1;

        let exit_pos = pos + params.hold_days;
        if exit_pos >= scored.len() {
            skipped += 1;
            continue;
        }
        let exit_idx = scored[exit_pos].0;

        let entry = bars[idx].close;
        let exit = bars[exit_idx].close;
        let max_high = bars[idx..exit_idx].iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let return_pct = (exit - entry) / entry * 100.0;

        trades.push(SignalTrade {
            entry_date: format_timestamp(bars[idx].timestamp, DATE_FORMAT),
            exit_date: format_timestamp(bars[exit_idx].timestamp, DATE_FORMAT),
            score,
            entry_price: entry,
            exit_price: exit,
            return_pct: round2(return_pct),
            max_return_pct: round2((max_high - entry) / entry * 100.0),
            win: return_pct > 0.0,
        });
    }

    let wins = trades.iter().filter(|t| t.win).count();
    let losses = trades.len() - wins;
    let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
    let (win_rate, average_return, return_std_dev) = if trades.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let std_dev = if returns.len() > 1 { returns.iter().std_dev() } else { 0.0 };
        (
            round1(wins as f64 / trades.len() as f64 * 100.0),
            round2(returns.iter().mean()),
            round2(std_dev),
        )
    };

    log::info!(
        "[{}] 백테스트 완료: 시그널 {}회, 진입 {}회, 승률 {:.1}%, 평균 수익률 {:+.2}%",
        history.ticker,
        signals,
        trades.len(),
        win_rate,
        average_return
    );

    Ok(SignalBacktestReport {
        ticker: history.ticker.clone(),
        params,
        signals,
        skipped,
        trades,
        wins,
        losses,
        win_rate,
        average_return,
        return_std_dev,
    })
}

pub struct SignalBacktester {
    source: Arc<dyn HistoricalDataProvider>,
}

impl SignalBacktester {
    pub fn new(source: Arc<dyn HistoricalDataProvider>) -> Self {
        SignalBacktester { source }
    }

    pub async fn run(&self, ticker: &str, params: SignalBacktestParams) -> Result<SignalBacktestReport, TerminalError> {
        let history = self.source.load_history(ticker).await?;
        run_signal_backtest(&history, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::data_provider::MockHistoricalDataProvider;
    use crate::models::market_data::Bar;

    const DAY_MS: i64 = 86_400_000;

    fn history_from(closes: &[f64]) -> PriceHistory {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64 * DAY_MS, c, c * 1.01, c * 0.99, c, 1000.0))
            .collect();
        PriceHistory::new("TEST", bars)
    }

    // 긴 하락 후 반등: 하락 구간 말미에서 과매도 점수가 높다
    fn crash_then_recover() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 3) as f64 * 0.1).collect();
        closes.extend((0..30).map(|i| 100.0 * 0.97_f64.powi(i + 1)));
        closes.extend((0..60).map(|i| 40.0 + i as f64 * 0.8));
        closes
    }

    #[test]
    fn test_too_short_history() {
        let history = history_from(&[100.0; 49]);
        assert!(matches!(
            run_signal_backtest(&history, SignalBacktestParams::default()),
            Err(TerminalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_zero_hold_days_rejected() {
        let history = history_from(&[100.0; 60]);
        let params = SignalBacktestParams { threshold: 80.0, hold_days: 0 };
        assert!(matches!(
            run_signal_backtest(&history, params),
            Err(TerminalError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_no_signals_on_steady_uptrend() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let report = run_signal_backtest(&history_from(&closes), SignalBacktestParams::default()).unwrap();
        assert_eq!(report.signals, 0);
        assert!(report.trades.is_empty());
        assert_eq!(report.win_rate, 0.0);
    }

    #[test]
    fn test_crash_signals_trade_into_recovery() {
        let params = SignalBacktestParams { threshold: 50.0, hold_days: 20 };
        let report = run_signal_backtest(&history_from(&crash_then_recover()), params).unwrap();

        assert!(report.signals > 0);
        assert_eq!(report.signals, report.trades.len() + report.skipped);
        assert_eq!(report.wins + report.losses, report.trades.len());
        for trade in &report.trades {
            assert!(trade.score >= 50.0);
            assert!(trade.max_return_pct >= 0.0);
        }
    }

    #[test]
    fn test_late_signals_are_skipped() {
        // 마지막까지 하락: 시그널은 끝부분에 몰려 청산일이 없다
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 3) as f64 * 0.1).collect();
        closes.extend((0..15).map(|i| 100.0 * 0.95_f64.powi(i + 1)));
        let params = SignalBacktestParams { threshold: 50.0, hold_days: 20 };
        let report = run_signal_backtest(&history_from(&closes), params).unwrap();

        assert!(report.signals > 0);
        assert_eq!(report.skipped, report.signals);
        assert!(report.trades.is_empty());
    }

    #[tokio::test]
    async fn test_backtester_loads_from_source() {
        let mut source = MockHistoricalDataProvider::new();
        source
            .expect_load_history()
            .times(1)
            .returning(|_| Ok(history_from(&crash_then_recover())));

        let backtester = SignalBacktester::new(Arc::new(source));
        let report = backtester.run("TEST", SignalBacktestParams::default()).await.unwrap();
        assert_eq!(report.ticker, "TEST");
    }
}
