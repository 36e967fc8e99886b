//! Portfolio rebalancing analysis and DCA allocation.

use crate::types::Portfolio;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A target weight for a ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAllocation {
    pub ticker: String,
    /// 0.0 to 1.0
    pub weight: f64,
}

impl TargetAllocation {
    pub fn new(ticker: &str, weight: f64) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            weight,
        }
    }
}

/// A recommended rebalance action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceAction {
    pub ticker: String,
    pub current_weight: f64,
    pub target_weight: f64,
    /// current - target
    pub deviation: f64,
    /// "OVERWEIGHT" | "UNDERWEIGHT" | "ON_TARGET" | "BUY"
    pub status: String,
    /// positive = buy, negative = sell
    pub dollar_amount: f64,
    /// approximate shares to trade
    pub shares: i64,
}

/// Calculate rebalance actions to align the portfolio with target
/// allocations.
///
/// # Arguments
///
/// * `portfolio` - Current portfolio
/// * `targets` - Target allocations
/// * `tolerance` - Deviation tolerance before flagging (typically 0.03)
///
/// # Returns
///
/// Actions sorted by absolute deviation, largest first.
pub fn calculate_rebalance(
    portfolio: &Portfolio,
    targets: &[TargetAllocation],
    tolerance: f64,
) -> Vec<RebalanceAction> {
    let net_assets = portfolio.net_assets;
    if net_assets <= 0.0 {
        return Vec::new();
    }

    let mut current_weights: HashMap<&str, f64> = HashMap::new();
    let mut current_prices: HashMap<&str, f64> = HashMap::new();
    for pos in &portfolio.positions {
        current_weights.insert(pos.ticker.as_str(), pos.weight);
        current_prices.insert(pos.ticker.as_str(), pos.current_price.unwrap_or(0.0));
    }

    let mut actions: Vec<RebalanceAction> = targets
        .iter()
        .map(|target| {
            let current_w = current_weights
                .get(target.ticker.as_str())
                .copied()
                .unwrap_or(0.0);
            let deviation = current_w - target.weight;
            let dollar_diff = -deviation * net_assets; // positive = need to buy

            let price = current_prices
                .get(target.ticker.as_str())
                .copied()
                .unwrap_or(0.0);
            let shares = if price > 0.0 {
                (dollar_diff / price) as i64
            } else {
                0
            };

            let status = if deviation.abs() <= tolerance {
                "ON_TARGET"
            } else if deviation > 0.0 {
                "OVERWEIGHT"
            } else {
                "UNDERWEIGHT"
            };

            RebalanceAction {
                ticker: target.ticker.clone(),
                current_weight: current_w,
                target_weight: target.weight,
                deviation,
                status: status.to_string(),
                dollar_amount: dollar_diff,
                shares,
            }
        })
        .collect();

    actions.sort_by(|a, b| {
        b.deviation
            .abs()
            .partial_cmp(&a.deviation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    actions
}

/// Propose how to allocate a DCA amount to reduce target deviations.
///
/// Only produces buy actions, never sells: the amount is split across
/// underweight targets in proportion to their dollar shortfall against the
/// post-investment NAV.
pub fn propose_dca_allocation(
    portfolio: &Portfolio,
    targets: &[TargetAllocation],
    amount: f64,
) -> Vec<RebalanceAction> {
    let net_assets = portfolio.net_assets;
    if net_assets <= 0.0 || amount <= 0.0 {
        return Vec::new();
    }

    // NAV after the new cash lands
    let future_nav = net_assets + amount;

    let mut current_weights: HashMap<&str, f64> = HashMap::new();
    let mut current_prices: HashMap<&str, f64> = HashMap::new();
    let mut current_values: HashMap<&str, f64> = HashMap::new();
    for pos in &portfolio.positions {
        current_weights.insert(pos.ticker.as_str(), pos.weight);
        current_prices.insert(pos.ticker.as_str(), pos.current_price.unwrap_or(0.0));
        current_values.insert(pos.ticker.as_str(), pos.market_value);
    }

    // (ticker, dollar shortfall, target weight)
    let mut underweight: Vec<(&TargetAllocation, f64)> = Vec::new();
    for target in targets {
        let current_value = current_values
            .get(target.ticker.as_str())
            .copied()
            .unwrap_or(0.0);
        let shortfall = target.weight * future_nav - current_value;
        if shortfall > 0.0 {
            underweight.push((target, shortfall));
        }
    }

    if underweight.is_empty() {
        return Vec::new();
    }

    let total_shortfall: f64 = underweight.iter().map(|(_, s)| s).sum();
    let mut actions: Vec<RebalanceAction> = underweight
        .into_iter()
        .map(|(target, shortfall)| {
            let alloc = if total_shortfall > 0.0 {
                amount * (shortfall / total_shortfall)
            } else {
                0.0
            };
            let price = current_prices
                .get(target.ticker.as_str())
                .copied()
                .unwrap_or(0.0);
            let shares = if price > 0.0 { (alloc / price) as i64 } else { 0 };
            let current_w = current_weights
                .get(target.ticker.as_str())
                .copied()
                .unwrap_or(0.0);

            RebalanceAction {
                ticker: target.ticker.clone(),
                current_weight: current_w,
                target_weight: target.weight,
                deviation: current_w - target.weight,
                status: "BUY".to_string(),
                dollar_amount: alloc,
                shares,
            }
        })
        .collect();

    actions.sort_by(|a, b| {
        b.dollar_amount
            .partial_cmp(&a.dollar_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    actions
}
