/**
* filename : rebalance
* author : HAMA
* date: 2025. 11. 7.
* description: 점수 기반 목표 비중 산출 및 리밸런싱 제안
**/

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::engine::analyzer::AnalysisContext;
use crate::engine::scoring::{round1, round2};
use crate::market_data::Period;
use crate::models::portfolio::Holding;

/// 비중 조정 임계값 (%p)
pub const ADJUSTMENT_THRESHOLD: f64 = 5.0;
/// 단일 종목 집중 경고 비중 (%)
pub const CONCENTRATION_LIMIT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceAction {
    Increase,
    Reduce,
    Keep,
}

impl RebalanceAction {
    pub fn from_adjustment(adjustment: f64) -> Self {
        if adjustment > ADJUSTMENT_THRESHOLD {
            RebalanceAction::Increase
        } else if adjustment < -ADJUSTMENT_THRESHOLD {
            RebalanceAction::Reduce
        } else {
            RebalanceAction::Keep
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RebalanceAction::Increase => "비중 확대",
            RebalanceAction::Reduce => "비중 축소",
            RebalanceAction::Keep => "유지",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortfolioGrade {
    Excellent,
    Good,
    Fair,
}

impl PortfolioGrade {
    pub fn from_average_score(score: f64) -> Self {
        if score >= 80.0 {
            PortfolioGrade::Excellent
        } else if score >= 70.0 {
            PortfolioGrade::Good
        } else {
            PortfolioGrade::Fair
        }
    }
}

/// 분석이 끝난 보유 종목 한 건
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHolding {
    pub name: String,
    pub ticker: String,
    pub quantity: f64,
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceLine {
    pub name: String,
    pub ticker: String,
    pub score: f64,
    pub current_price: f64,
    pub day_change_pct: f64,
    pub evaluation: f64,
    pub current_weight: f64,
    pub target_weight: f64,
    pub adjustment: f64,
    pub adjustment_amount: f64,
    pub action: RebalanceAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSummary {
    pub total_value: f64,
    pub total_change: f64,
    pub average_score: f64,
    pub grade: PortfolioGrade,
    pub concentration_warning: bool,
    pub max_weight: f64,
    pub rebalance_count: usize,
    pub diversification_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlan {
    pub lines: Vec<RebalanceLine>,
    pub summary: Option<RebalanceSummary>,
    pub failed: Vec<String>,
}

/// 평가금액 비중과 점수 비중을 비교해 조정안을 만든다.
///
/// 평가금액 합이 0이면 요약 없이 빈 계획을 돌려준다.
pub fn plan_rebalance(holdings: &[ScoredHolding]) -> RebalancePlan {
    let evaluations: Vec<f64> = holdings.iter().map(|h| h.current_price * h.quantity).collect();
    let total_value: f64 = evaluations.iter().sum();
    if holdings.is_empty() || total_value <= 0.0 {
        return RebalancePlan {
            lines: vec![],
            summary: None,
            failed: vec![],
        };
    }

    let score_sum: f64 = holdings.iter().map(|h| h.score).sum();
    let equal_weight = 100.0 / holdings.len() as f64;

    let lines: Vec<RebalanceLine> = holdings
        .iter()
        .zip(evaluations.iter())
        .map(|(holding, &evaluation)| {
            let current_weight = evaluation / total_value * 100.0;
            let target_weight = if score_sum > 0.0 {
                holding.score / score_sum * 100.0
            } else {
                equal_weight
            };
            let adjustment = target_weight - current_weight;
            let day_change_pct = match holding.previous_close {
                Some(prev) if prev > 0.0 => (holding.current_price - prev) / prev * 100.0,
                _ => 0.0,
            };

            RebalanceLine {
                name: holding.name.clone(),
                ticker: holding.ticker.clone(),
                score: holding.score,
                current_price: holding.current_price,
                day_change_pct: round2(day_change_pct),
                evaluation,
                current_weight,
                target_weight,
                adjustment,
                adjustment_amount: adjustment / 100.0 * total_value,
                action: RebalanceAction::from_adjustment(adjustment),
            }
        })
        .collect();

    let max_weight = lines.iter().map(|l| l.current_weight).fold(0.0, f64::max);
    let average_score = score_sum / holdings.len() as f64;
    let total_change = lines
        .iter()
        .map(|l| l.evaluation * l.day_change_pct / 100.0)
        .sum();

    let summary = RebalanceSummary {
        total_value,
        total_change,
        average_score: round1(average_score),
        grade: PortfolioGrade::from_average_score(average_score),
        concentration_warning: max_weight > CONCENTRATION_LIMIT,
        max_weight: round1(max_weight),
        rebalance_count: lines.iter().filter(|l| l.action != RebalanceAction::Keep).count(),
        diversification_index: round1(100.0 - max_weight),
    };

    RebalancePlan {
        lines,
        summary: Some(summary),
        failed: vec![],
    }
}

pub struct Rebalancer {
    context: AnalysisContext,
    period: Period,
    concurrency: usize,
}

impl Rebalancer {
    pub fn new(context: AnalysisContext) -> Self {
        Rebalancer {
            context,
            period: Period::OneYear,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 보유 종목을 모두 분석한 뒤 조정안 작성. 분석 실패 종목은 failed 로 분리
    pub async fn plan(&self, holdings: &[Holding]) -> RebalancePlan {
        let period = self.period;
        let mut outcomes: Vec<(usize, Result<ScoredHolding, String>)> =
            stream::iter(holdings.iter().cloned().enumerate())
                .map(|(index, holding)| {
                    let context = self.context.clone();
                    async move { (index, score_holding(&context, holding, period).await) }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut scored = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(holding) => scored.push(holding),
                Err(ticker) => failed.push(ticker),
            }
        }

        if !failed.is_empty() {
            log::warn!("리밸런싱 분석 실패 종목: {:?}", failed);
        }

        let mut plan = plan_rebalance(&scored);
        plan.failed = failed;
        plan
    }
}

async fn score_holding(context: &AnalysisContext, holding: Holding, period: Period) -> Result<ScoredHolding, String> {
    let analyzer = context.analyzer(&holding.ticker).map_err(|_| holding.ticker.clone())?;
    let result = analyzer.analyze(period, false).await;
    if !result.success {
        return Err(holding.ticker);
    }

    let previous_close = result.frame.as_ref().and_then(|frame| {
        let closes = &frame.close;
        closes.len().checked_sub(2).map(|i| closes[i])
    });

    Ok(ScoredHolding {
        name: holding.name,
        ticker: holding.ticker,
        quantity: holding.quantity,
        current_price: result.current_price,
        previous_close,
        score: result.score,
    })
}
