//! Portfolio sources, aggregation, history, and risk analytics.

mod aggregate;
mod history;
mod risk;
mod source;

pub use aggregate::{aggregate_portfolios, merge_positions};
pub use history::{
    compute_performance, filter_by_period, HistoryFile, HistoryPerformance, SnapshotOutcome,
    SnapshotRow,
};
pub use risk::{
    calculate_max_drawdown, calculate_risk_metrics, daily_returns, norm_ppf,
    portfolio_concentration, volatility,
};
pub use source::{DemoSource, JsonFileSource, PortfolioSource};
