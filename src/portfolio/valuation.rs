/**
* filename : valuation
* author : HAMA
* date: 2025. 11. 7.
* description: 보유 종목 평가 (현재가, 수익률, 점수, 손절선)
**/

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::engine::analyzer::{AnalysisContext, Verdict};
use crate::engine::scoring::round2;
use crate::market_data::Period;
use crate::models::portfolio::Holding;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub name: String,
    pub ticker: String,
    pub avg_price: f64,
    pub quantity: f64,
    pub current_price: Option<f64>,
    pub return_pct: f64,
    pub evaluation: f64,
    pub invested: f64,
    pub profit: f64,
    pub score: Option<f64>,
    pub verdict: Option<Verdict>,
    pub stop_loss: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub positions: Vec<PositionReport>,
    pub total_invested: f64,
    pub total_evaluation: f64,
    pub total_profit: f64,
    pub total_return_pct: f64,
}

impl PositionReport {
    /// 가격이 없으면 평가 0, 수익률 0
    pub fn from_holding(holding: &Holding, current_price: Option<f64>) -> Self {
        let invested = holding.invested();
        let (return_pct, evaluation) = match current_price {
            Some(price) => (holding.return_pct(price), price * holding.quantity),
            None => (0.0, 0.0),
        };

        PositionReport {
            name: holding.name.clone(),
            ticker: holding.ticker.clone(),
            avg_price: holding.avg_price,
            quantity: holding.quantity,
            current_price,
            return_pct: round2(return_pct),
            evaluation,
            invested,
            profit: if current_price.is_some() { evaluation - invested } else { 0.0 },
            score: None,
            verdict: None,
            stop_loss: None,
            error: None,
        }
    }
}

impl PortfolioReport {
    pub fn from_positions(positions: Vec<PositionReport>) -> Self {
        let priced = positions.iter().filter(|p| p.current_price.is_some());
        let (total_invested, total_evaluation) =
            priced.fold((0.0, 0.0), |(inv, eval), p| (inv + p.invested, eval + p.evaluation));
        let total_return_pct = if total_invested > 0.0 {
            round2((total_evaluation - total_invested) / total_invested * 100.0)
        } else {
            0.0
        };

        PortfolioReport {
            positions,
            total_invested,
            total_evaluation,
            total_profit: total_evaluation - total_invested,
            total_return_pct,
        }
    }
}

pub struct PortfolioValuator {
    context: AnalysisContext,
    period: Period,
    concurrency: usize,
}

impl PortfolioValuator {
    pub fn new(context: AnalysisContext) -> Self {
        PortfolioValuator {
            context,
            period: Period::OneYear,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 보유 순서를 유지한 평가 보고서
    pub async fn report(&self, holdings: &[Holding]) -> PortfolioReport {
        let period = self.period;
        let positions: Vec<PositionReport> = stream::iter(holdings.iter().cloned())
            .map(|holding| {
                let context = self.context.clone();
                async move { value_position(&context, &holding, period).await }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        PortfolioReport::from_positions(positions)
    }
}

async fn value_position(context: &AnalysisContext, holding: &Holding, period: Period) -> PositionReport {
    let analysis = match context.analyzer(&holding.ticker) {
        Ok(analyzer) => Some(analyzer.analyze(period, false).await),
        Err(e) => {
            log::warn!("[{}] 평가 불가: {}", holding.ticker, e);
            None
        }
    };

    match analysis {
        Some(result) if result.success => {
            let mut report = PositionReport::from_holding(holding, Some(result.current_price));
            report.score = Some(result.score);
            report.verdict = result.verdict;
            report.stop_loss = Some(result.stop_loss);
            report
        }
        other => {
            // 분석 실패 시 시세만이라도 조회
            let price = context.data.latest_price(&holding.ticker).await;
            let mut report = PositionReport::from_holding(holding, price);
            report.error = other
                .and_then(|r| r.error_msg)
                .or_else(|| Some("analysis unavailable".to_string()));
            report
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_math() {
        let holding = Holding::new("Apple", "AAPL", 100.0, 10.0);
        let report = PositionReport::from_holding(&holding, Some(125.0));
        assert_eq!(report.return_pct, 25.0);
        assert_eq!(report.evaluation, 1250.0);
        assert_eq!(report.invested, 1000.0);
        assert_eq!(report.profit, 250.0);
    }

    #[test]
    fn test_position_without_price() {
        let holding = Holding::new("Apple", "AAPL", 100.0, 10.0);
        let report = PositionReport::from_holding(&holding, None);
        assert_eq!(report.return_pct, 0.0);
        assert_eq!(report.evaluation, 0.0);
        assert_eq!(report.profit, 0.0);
    }

    #[test]
    fn test_portfolio_totals_skip_unpriced() {
        let a = PositionReport::from_holding(&Holding::new("A", "A", 100.0, 10.0), Some(110.0));
        let b = PositionReport::from_holding(&Holding::new("B", "B", 50.0, 10.0), Some(40.0));
        let c = PositionReport::from_holding(&Holding::new("C", "C", 10.0, 10.0), None);
        let report = PortfolioReport::from_positions(vec![a, b, c]);

        assert_eq!(report.total_invested, 1500.0);
        assert_eq!(report.total_evaluation, 1500.0);
        assert_eq!(report.total_return_pct, 0.0);
        assert_eq!(report.positions.len(), 3);
    }
}
