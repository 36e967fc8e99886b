//! Portfolio analysis: stress scenarios, rebalancing, bubble-risk scoring.

mod bubble;
mod rebalance;
mod stress;

pub use bubble::{
    bubble_risk_score, calculate_bubble_index, classify_regime, percentile_rank, BubbleIndex,
    BubbleRisk, IndicatorScore,
};
pub use rebalance::{calculate_rebalance, propose_dca_allocation, RebalanceAction, TargetAllocation};
pub use stress::{builtin_scenarios, stress_test_portfolio, PositionImpact, Scenario, StressResult};
