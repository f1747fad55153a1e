/**
* filename : analyzer
* author : HAMA
* date: 2025. 11. 6.
* description: 종목 분석 파이프라인 (수집 -> 지표 -> 필터 -> 채점 -> 판정)
**/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::fundamentals::{FundamentalsChecker, FundamentalsResult, FundamentalsSource};
use crate::engine::indicator_engine::{IndicatorEngine, IndicatorFrame, IndicatorSnapshot};
use crate::engine::report::{build_detail_cards, DetailCard, ReportContext};
use crate::engine::scoring::{calculate_sharp_score, calculate_trend_score, round1, round2, ScoreInputs};
use crate::error::TerminalError;
use crate::indicators::{indicator_series, SimpleMovingAverage};
use crate::market_data::{DataClient, Period};
use crate::utils::logging;

/// 폭포수 판정 최소 봉 수 / 장기 이평 기간 / 비교 구간
const WATERFALL_MIN_BARS: usize = 50;
const LONG_TREND_WINDOW: usize = 120;
const WATERFALL_LOOKBACK: usize = 20;

const HOOK_RSI_CEILING: f64 = 40.0;

/// 점수 구간별 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    StrongBuy,
    Scout,
    Watch,
    Flee,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Verdict::StrongBuy
        } else if score >= 50.0 {
            Verdict::Scout
        } else if score >= 30.0 {
            Verdict::Watch
        } else {
            Verdict::Flee
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::StrongBuy => "[천재지변급 기회 - 분할 매수 즉시]",
            Verdict::Scout => "[애매한 반등 - 정찰병만 투입]",
            Verdict::Watch => "[추세 하락 - 관망]",
            Verdict::Flee => "[폭락/인버스 - 도망]",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 매매 행동 (필터 우선, 모드별 분기)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Avoid,
    Wait,
    Buy,
    Sell,
    Overheated,
    Hold,
    Fakeout,
    StrongBuy,
    NoTrend,
    Watch,
}

/// 저점매수 모드에서 낮은 점수를 과열로 보는 RSI 하한
const OVERHEATED_RSI: f64 = 65.0;

impl Action {
    pub fn decide(
        score: f64,
        strategy: Strategy,
        rsi: f64,
        is_waterfall: bool,
        is_rsi_hook_failed: bool,
    ) -> Self {
        match strategy {
            Strategy::MeanReversion => {
                if is_waterfall {
                    Action::Avoid
                } else if is_rsi_hook_failed {
                    Action::Wait
                } else if score >= 70.0 {
                    Action::Buy
                } else if score <= 30.0 {
                    if rsi >= OVERHEATED_RSI {
                        Action::Overheated
                    } else {
                        Action::Sell
                    }
                } else {
                    Action::Hold
                }
            }
            // 추세 모드는 Hook 실패를 보지 않는다
            Strategy::Trend => {
                if is_waterfall {
                    Action::Fakeout
                } else if score >= 75.0 {
                    Action::StrongBuy
                } else if score <= 40.0 {
                    Action::NoTrend
                } else {
                    Action::Watch
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Avoid => "[절대 매수 금지 (AVOID)]",
            Action::Wait => "[바닥 확인 대기 (WAIT)]",
            Action::Buy => "[적극 매수 (BUY)]",
            Action::Sell => "[매도 및 회피 (SELL)]",
            Action::Overheated => "[과열 경고 (Overheated)]",
            Action::Hold => "[보류 및 관망 (HOLD)]",
            Action::Fakeout => "[가짜 반등 주의 (Fakeout)]",
            Action::StrongBuy => "[강력 돌파 (Strong Buy)]",
            Action::NoTrend => "[추세 소멸 (No Trend)]",
            Action::Watch => "[추세 관찰 (Watch)]",
        }
    }
}

/// 채점 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// 역추세 (저점매수)
    MeanReversion,
    /// 추세추종 (돌파매매)
    Trend,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::MeanReversion
    }
}

impl FromStr for Strategy {
    type Err = TerminalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean_reversion" | "reversion" => Ok(Strategy::MeanReversion),
            "trend" => Ok(Strategy::Trend),
            other => Err(TerminalError::InvalidParameter(format!("Unknown strategy: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFlags {
    pub is_waterfall: bool,
    pub is_rsi_hook_failed: bool,
}

/// 분석 결과. 실패도 success = false 로 담는다
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub success: bool,
    pub score: f64,
    pub verdict: Option<Verdict>,
    pub action: Option<Action>,
    pub current_price: f64,
    pub stop_loss: f64,
    pub indicators: Option<IndicatorSnapshot>,
    pub filters: FilterFlags,
    pub fundamentals: Option<FundamentalsResult>,
    pub detail_info: Vec<DetailCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<IndicatorFrame>,
    pub error_msg: Option<String>,
    pub error_type: Option<String>,
}

impl AnalysisResult {
    pub fn failure(ticker: &str, error: &TerminalError) -> Self {
        AnalysisResult {
            ticker: ticker.to_string(),
            success: false,
            error_msg: Some(error.to_string()),
            error_type: Some(error.kind().to_string()),
            ..Default::default()
        }
    }
}

/// 2×ATR 동적 손절선 (하한 -15%), ATR 없으면 -10%
pub fn dynamic_stop(price: f64, atr: f64) -> f64 {
    if atr > 0.0 {
        round2((price - 2.0 * atr).max(price * 0.85))
    } else {
        round2(price * 0.90)
    }
}

/// 장기 이평(최대 120일)이 20봉 전보다 낮으면 폭포수
pub fn is_waterfall(closes: &[f64]) -> bool {
    if closes.len() < WATERFALL_MIN_BARS {
        return false;
    }

    let window = closes.len().min(LONG_TREND_WINDOW);
    let mut sma = SimpleMovingAverage::new(window);
    let bars: Vec<_> = closes
        .iter()
        .enumerate()
        .map(|(i, c)| crate::models::Bar::new(i as i64, *c, *c, *c, *c, 0.0))
        .collect();
    let series = match indicator_series(&mut sma, &bars) {
        Ok(series) => series,
        Err(_) => return false,
    };

    let lookback = series.len().min(WATERFALL_LOOKBACK);
    match (series.last().copied().flatten(), series[series.len() - lookback]) {
        (Some(last), Some(earlier)) => last < earlier,
        _ => false,
    }
}

/// 과매도권(≤40)에서 RSI가 전일보다 오르지 못함
pub fn is_rsi_hook_failed(rsi: &[f64]) -> bool {
    match rsi {
        [.., previous, last] => *last <= HOOK_RSI_CEILING && last <= previous,
        _ => false,
    }
}

/// 분석기 의존성 묶음 (스캐너/리밸런싱/API 공용)
#[derive(Clone)]
pub struct AnalysisContext {
    pub data: Arc<DataClient>,
    pub fundamentals: Option<Arc<dyn FundamentalsSource>>,
}

impl AnalysisContext {
    pub fn new(data: Arc<DataClient>, fundamentals: Option<Arc<dyn FundamentalsSource>>) -> Self {
        AnalysisContext { data, fundamentals }
    }

    pub fn analyzer(&self, ticker: &str) -> Result<StockAnalyzer, TerminalError> {
        let analyzer = StockAnalyzer::new(ticker, self.data.clone())?;
        Ok(match &self.fundamentals {
            Some(source) => analyzer.with_fundamentals(source.clone()),
            None => analyzer,
        })
    }
}

pub struct StockAnalyzer {
    ticker: String,
    data: Arc<DataClient>,
    engine: IndicatorEngine,
    fundamentals: Option<Arc<dyn FundamentalsSource>>,
    checker: FundamentalsChecker,
}

impl StockAnalyzer {
    pub fn new(ticker: &str, data: Arc<DataClient>) -> Result<Self, TerminalError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(TerminalError::InvalidParameter("ticker must not be empty".to_string()));
        }

        Ok(StockAnalyzer {
            ticker: ticker.to_uppercase(),
            data,
            engine: IndicatorEngine::default(),
            fundamentals: None,
            checker: FundamentalsChecker::new(),
        })
    }

    pub fn with_fundamentals(mut self, source: Arc<dyn FundamentalsSource>) -> Self {
        self.fundamentals = Some(source);
        self
    }

    pub fn with_engine(mut self, engine: IndicatorEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// 역추세 모드 분석. 실패해도 에러 대신 success = false 결과
    pub async fn analyze(&self, period: Period, apply_fundamental: bool) -> AnalysisResult {
        self.analyze_with(period, apply_fundamental, Strategy::MeanReversion).await
    }

    pub async fn analyze_with(
        &self,
        period: Period,
        apply_fundamental: bool,
        strategy: Strategy,
    ) -> AnalysisResult {
        match self.run(period, apply_fundamental, strategy).await {
            Ok(result) => {
                logging::log_analysis_done(&self.ticker, result.score, result.verdict.map(|v| v.label()).unwrap_or(""));
                result
            }
            Err(e) => {
                match &e {
                    TerminalError::InsufficientData(_) => log::warn!("[{}] 데이터 부족: {}", self.ticker, e),
                    _ => logging::log_error(&self.ticker, &e),
                }
                AnalysisResult::failure(&self.ticker, &e)
            }
        }
    }

    async fn run(
        &self,
        period: Period,
        apply_fundamental: bool,
        strategy: Strategy,
    ) -> Result<AnalysisResult, TerminalError> {
        let history = self.data.fetch(&self.ticker, period).await?;
        let last_close = history
            .last_close()
            .ok_or_else(|| TerminalError::InsufficientData(format!("{}: empty history", self.ticker)))?;
        let current_price = self.data.latest_price(&self.ticker).await.unwrap_or(last_close);

        let (snapshot, frame) = self.engine.compute(&history, current_price)?;

        let filters = FilterFlags {
            is_waterfall: is_waterfall(&frame.close),
            is_rsi_hook_failed: strategy == Strategy::MeanReversion && is_rsi_hook_failed(&frame.rsi),
        };

        let inputs = ScoreInputs {
            rsi: snapshot.rsi,
            mfi: snapshot.mfi,
            bb_lower: snapshot.bb_lower,
            bb_upper: snapshot.bb_upper,
            price: current_price,
            macd_diff: snapshot.macd_diff,
            macd_diff_pct: Some(snapshot.macd_diff_pct),
            ichi_a: snapshot.ichi_a,
            ichi_b: snapshot.ichi_b,
            vwap: Some(snapshot.vwap),
            is_waterfall: filters.is_waterfall,
            is_rsi_hook_failed: filters.is_rsi_hook_failed,
        };
        let tech_score = match strategy {
            Strategy::MeanReversion => calculate_sharp_score(&inputs),
            Strategy::Trend => calculate_trend_score(&inputs),
        };

        let fundamentals = match (apply_fundamental, &self.fundamentals) {
            (true, Some(source)) => Some(self.checker.check(source.as_ref(), &self.ticker).await),
            (true, None) => {
                log::debug!("[{}] 재무 데이터 소스 미설정, 검증 생략", self.ticker);
                None
            }
            _ => None,
        };
        let penalty = fundamentals.as_ref().map(|f| f.penalty).unwrap_or(0.0);

        let score = round1((tech_score - penalty).clamp(0.0, 100.0));
        let verdict = Verdict::from_score(score);
        let action = Action::decide(
            score,
            strategy,
            snapshot.rsi,
            filters.is_waterfall,
            filters.is_rsi_hook_failed,
        );
        let stop_loss = dynamic_stop(current_price, snapshot.atr);

        let detail_info = build_detail_cards(&ReportContext {
            snapshot: &snapshot,
            inputs: &inputs,
            strategy,
            action,
            fundamentals: fundamentals.as_ref(),
            stop_loss,
        });

        Ok(AnalysisResult {
            ticker: self.ticker.clone(),
            success: true,
            score,
            verdict: Some(verdict),
            action: Some(action),
            current_price,
            stop_loss,
            indicators: Some(snapshot),
            filters,
            fundamentals,
            detail_info,
            frame: Some(frame),
            error_msg: None,
            error_type: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(80.0, Verdict::StrongBuy)]
    #[case(79.9, Verdict::Scout)]
    #[case(50.0, Verdict::Scout)]
    #[case(30.0, Verdict::Watch)]
    #[case(29.9, Verdict::Flee)]
    fn test_verdict_thresholds(#[case] score: f64, #[case] expected: Verdict) {
        assert_eq!(Verdict::from_score(score), expected);
    }

    #[rstest]
    #[case(90.0, 50.0, true, false, Action::Avoid)]
    #[case(90.0, 50.0, true, true, Action::Avoid)]
    #[case(90.0, 50.0, false, true, Action::Wait)]
    #[case(70.0, 50.0, false, false, Action::Buy)]
    #[case(30.0, 50.0, false, false, Action::Sell)]
    #[case(30.0, 65.0, false, false, Action::Overheated)]
    #[case(10.0, 80.0, false, false, Action::Overheated)]
    #[case(50.0, 80.0, false, false, Action::Hold)]
    #[case(50.0, 50.0, false, false, Action::Hold)]
    fn test_mean_reversion_action(
        #[case] score: f64,
        #[case] rsi: f64,
        #[case] waterfall: bool,
        #[case] hook: bool,
        #[case] expected: Action,
    ) {
        assert_eq!(Action::decide(score, Strategy::MeanReversion, rsi, waterfall, hook), expected);
    }

    #[rstest]
    #[case(90.0, 60.0, true, false, Action::Fakeout)]
    #[case(90.0, 60.0, true, true, Action::Fakeout)]
    #[case(75.0, 60.0, false, true, Action::StrongBuy)]
    #[case(74.9, 60.0, false, false, Action::Watch)]
    #[case(40.1, 60.0, false, false, Action::Watch)]
    #[case(40.0, 60.0, false, false, Action::NoTrend)]
    #[case(10.0, 80.0, false, false, Action::NoTrend)]
    fn test_trend_action(
        #[case] score: f64,
        #[case] rsi: f64,
        #[case] waterfall: bool,
        #[case] hook: bool,
        #[case] expected: Action,
    ) {
        assert_eq!(Action::decide(score, Strategy::Trend, rsi, waterfall, hook), expected);
    }

    #[test]
    fn test_action_labels_distinct() {
        let all = [
            Action::Avoid,
            Action::Wait,
            Action::Buy,
            Action::Sell,
            Action::Overheated,
            Action::Hold,
            Action::Fakeout,
            Action::StrongBuy,
            Action::NoTrend,
            Action::Watch,
        ];
        let labels: std::collections::HashSet<&str> = all.iter().map(|a| a.label()).collect();
        assert_eq!(labels.len(), all.len());
    }

    #[rstest]
    #[case(100.0, 2.0, 96.0)]
    #[case(100.0, 10.0, 85.0)]
    #[case(100.0, 0.0, 90.0)]
    #[case(33.333, 1.0, 31.33)]
    fn test_dynamic_stop(#[case] price: f64, #[case] atr: f64, #[case] expected: f64) {
        let stop = dynamic_stop(price, atr);
        assert_eq!(stop, expected);
        assert!(stop < price);
    }

    #[test]
    fn test_waterfall_needs_50_bars() {
        let falling: Vec<f64> = (0..49).map(|i| 200.0 - i as f64).collect();
        assert!(!is_waterfall(&falling));
    }

    #[test]
    fn test_waterfall_on_long_decline() {
        let falling: Vec<f64> = (0..200).map(|i| 400.0 - i as f64).collect();
        assert!(is_waterfall(&falling));

        let rising: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        assert!(!is_waterfall(&rising));
    }

    #[test]
    fn test_rsi_hook() {
        assert!(is_rsi_hook_failed(&[35.0, 32.0]));
        assert!(is_rsi_hook_failed(&[32.0, 32.0]));
        assert!(!is_rsi_hook_failed(&[30.0, 33.0]));
        assert!(!is_rsi_hook_failed(&[50.0, 45.0]));
        assert!(!is_rsi_hook_failed(&[30.0]));
    }

    #[test]
    fn test_failure_result_carries_kind() {
        let err = TerminalError::InsufficientData("5 rows".to_string());
        let result = AnalysisResult::failure("AAPL", &err);
        assert!(!result.success);
        assert_eq!(result.error_type.as_deref(), Some("InsufficientData"));
    }

    #[rstest]
    #[case("trend", Strategy::Trend)]
    #[case("MEAN_REVERSION", Strategy::MeanReversion)]
    fn test_strategy_parse(#[case] input: &str, #[case] expected: Strategy) {
        assert_eq!(input.parse::<Strategy>().unwrap(), expected);
    }
}
