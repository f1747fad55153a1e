pub mod rebalance;
pub mod store;
pub mod valuation;

pub use rebalance::{plan_rebalance, PortfolioGrade, RebalanceAction, RebalancePlan, Rebalancer, ScoredHolding};
pub use store::PortfolioStore;
pub use valuation::{PortfolioReport, PortfolioValuator, PositionReport};
