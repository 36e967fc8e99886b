//! Leverage-adjusted stress testing.

use crate::config::LeveragedEtf;
use crate::types::Portfolio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A historical or hypothetical stress scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// benchmark ticker -> return (-0.34 for -34%)
    pub moves: HashMap<String, f64>,
}

impl Scenario {
    pub fn new(name: &str, moves: &[(&str, f64)]) -> Self {
        Self {
            name: name.to_string(),
            moves: moves
                .iter()
                .map(|(ticker, mv)| (ticker.to_string(), *mv))
                .collect(),
        }
    }
}

/// Estimated impact of a scenario on a single position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionImpact {
    pub ticker: String,
    pub weight: f64,
    pub leverage: f64,
    pub benchmark: String,
    pub bench_move: f64,
    pub impact: f64,
}

/// Result of a single stress scenario on the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressResult {
    pub scenario: String,
    /// Total portfolio return under the scenario
    pub portfolio_impact: f64,
    pub position_impacts: Vec<PositionImpact>,
}

/// Built-in historical scenarios.
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("COVID Crash (Mar 2020)", &[("SPY", -0.34), ("QQQ", -0.28)]),
        Scenario::new("Aug 5 2024 Selloff", &[("SPY", -0.08), ("QQQ", -0.10)]),
        Scenario::new("2022 Bear Market", &[("SPY", -0.25), ("QQQ", -0.33)]),
        Scenario::new("Flash Crash 2010", &[("SPY", -0.07), ("QQQ", -0.08)]),
        Scenario::new("Custom -10%", &[("SPY", -0.10), ("QQQ", -0.10)]),
    ]
}

// Tickers that are themselves a scenario benchmark (or track one 1:1)
fn benchmark_alias(ticker: &str) -> Option<&'static str> {
    match ticker {
        "QQQ" => Some("QQQ"),
        "SPY" | "VOO" | "IVV" => Some("SPY"),
        _ => None,
    }
}

/// The signed leverage factor for a ticker (1.0 for non-leveraged).
fn leverage_factor(ticker: &str, registry: &HashMap<String, LeveragedEtf>) -> f64 {
    registry.get(ticker).map(|etf| etf.leverage).unwrap_or(1.0)
}

/// The scenario benchmark for a ticker.
fn benchmark_for(ticker: &str, registry: &HashMap<String, LeveragedEtf>) -> String {
    if let Some(etf) = registry.get(ticker) {
        return etf.underlying.clone();
    }
    benchmark_alias(ticker).unwrap_or("SPY").to_string()
}

/// Run stress test scenarios on the portfolio.
///
/// For each position the estimated impact is
/// `weight * leverage_factor * scenario_benchmark_move`; benchmarks without
/// a move in the scenario fall back to the SPY move (or -10%).
///
/// # Arguments
///
/// * `portfolio` - Portfolio snapshot
/// * `registry` - Leveraged instrument registry
/// * `scenarios` - Scenarios to test (None for the built-ins)
pub fn stress_test_portfolio(
    portfolio: &Portfolio,
    registry: &HashMap<String, LeveragedEtf>,
    scenarios: Option<&[Scenario]>,
) -> Vec<StressResult> {
    let builtin;
    let scenarios = match scenarios {
        Some(s) => s,
        None => {
            builtin = builtin_scenarios();
            &builtin
        }
    };

    if portfolio.positions.is_empty() {
        return Vec::new();
    }

    let mut results = Vec::with_capacity(scenarios.len());

    for scenario in scenarios {
        let mut total_impact = 0.0;
        let mut position_impacts = Vec::with_capacity(portfolio.positions.len());

        for pos in &portfolio.positions {
            let leverage = leverage_factor(&pos.ticker, registry);
            let benchmark = benchmark_for(&pos.ticker, registry);

            let bench_move = scenario
                .moves
                .get(&benchmark)
                .or_else(|| scenario.moves.get("SPY"))
                .copied()
                .unwrap_or(-0.10);
            let impact = pos.weight * leverage * bench_move;

            total_impact += impact;
            position_impacts.push(PositionImpact {
                ticker: pos.ticker.clone(),
                weight: pos.weight,
                leverage,
                benchmark,
                bench_move,
                impact,
            });
        }

        results.push(StressResult {
            scenario: scenario.name.clone(),
            portfolio_impact: total_impact,
            position_impacts,
        });
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_leveraged_etfs;
    use crate::types::Position;

    fn portfolio() -> Portfolio {
        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 100_000.0;
        portfolio
            .positions
            .push(Position::new("SPY", 100.0, 50_000.0).with_weight(0.50));
        portfolio
            .positions
            .push(Position::new("TQQQ", 100.0, 30_000.0).with_weight(0.30));
        portfolio
            .positions
            .push(Position::new("SQQQ", 100.0, 20_000.0).with_weight(0.20));
        portfolio
    }

    #[test]
    fn test_stress_leverage_and_inverse() {
        let registry = default_leveraged_etfs();
        let scenarios = [Scenario::new("Down 10", &[("SPY", -0.10), ("QQQ", -0.10)])];

        let results = stress_test_portfolio(&portfolio(), &registry, Some(&scenarios));
        assert_eq!(results.len(), 1);

        let result = &results[0];
        // SPY: 0.5 * 1 * -0.10 = -0.05
        // TQQQ: 0.3 * 3 * -0.10 = -0.09
        // SQQQ: 0.2 * -3 * -0.10 = +0.06
        assert!((result.portfolio_impact + 0.08).abs() < 1e-9);

        let tqqq = &result.position_impacts[1];
        assert_eq!(tqqq.benchmark, "QQQ");
        assert_eq!(tqqq.leverage, 3.0);
        assert!((tqqq.impact + 0.09).abs() < 1e-9);

        let sqqq = &result.position_impacts[2];
        assert!((sqqq.impact - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_benchmark_falls_back_to_spy() {
        let registry = default_leveraged_etfs();
        let mut portfolio = Portfolio::new();
        portfolio
            .positions
            .push(Position::new("SOXL", 10.0, 10_000.0).with_weight(1.0));

        let scenarios = [Scenario::new("Down 10", &[("SPY", -0.10)])];
        let results = stress_test_portfolio(&portfolio, &registry, Some(&scenarios));

        let soxl = &results[0].position_impacts[0];
        // SOXX benchmark has no move in the scenario: SPY's -10% applies
        assert_eq!(soxl.benchmark, "SOXX");
        assert!((soxl.impact + 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_builtin_scenarios_run() {
        let registry = default_leveraged_etfs();
        let results = stress_test_portfolio(&portfolio(), &registry, None);
        assert_eq!(results.len(), 5);
        for result in &results {
            assert_eq!(result.position_impacts.len(), 3);
        }
    }

    #[test]
    fn test_empty_portfolio() {
        let registry = default_leveraged_etfs();
        assert!(stress_test_portfolio(&Portfolio::new(), &registry, None).is_empty());
    }
}
