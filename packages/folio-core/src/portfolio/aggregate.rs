//! Multi-source portfolio aggregation.

use crate::portfolio::PortfolioSource;
use crate::types::{Portfolio, Position};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use tracing::warn;

/// Fetch and merge portfolios from multiple sources.
///
/// Positions with the same ticker are combined (quantity, market value and
/// P&L summed; average cost weighted). Sources that fail are skipped with a
/// warning; it is an error only when every source fails.
pub fn aggregate_portfolios(sources: &mut [Box<dyn PortfolioSource>]) -> Result<Portfolio> {
    let mut all_positions: Vec<Position> = Vec::new();
    let mut total_cash = 0.0;
    let mut total_net = 0.0;
    let mut total_mv = 0.0;
    let mut total_buying = 0.0;
    let mut total_day_pnl = 0.0;
    let mut tags: Vec<String> = Vec::new();

    for source in sources.iter_mut() {
        let name = source.name().to_string();
        match source.fetch() {
            Ok(port) => {
                all_positions.extend(port.positions);
                total_cash += port.cash;
                total_net += port.net_assets;
                total_mv += port.market_value;
                total_buying += port.buying_power;
                total_day_pnl += port.day_pnl;
                tags.push(if port.source.is_empty() {
                    name
                } else {
                    port.source
                });
            }
            Err(err) => {
                warn!(source = %name, %err, "portfolio source failed, skipping");
            }
        }
    }

    if tags.is_empty() {
        return Err(Error::Source("no portfolio source returned data".to_string()));
    }

    let mut merged = Portfolio {
        positions: merge_positions(all_positions),
        cash: total_cash,
        net_assets: total_net,
        market_value: total_mv,
        buying_power: total_buying,
        day_pnl: total_day_pnl,
        day_pnl_pct: if total_net > 0.0 {
            total_day_pnl / total_net
        } else {
            0.0
        },
        source: tags.join("+"),
        timestamp: Some(Utc::now()),
        ..Portfolio::new()
    };
    merged.recompute_weights();

    Ok(merged)
}

/// Merge positions with the same ticker.
///
/// For duplicate tickers: sum quantity/market_value/day_pnl/unrealized_pnl,
/// weighted-average avg_cost, take the first available current price.
/// First-seen ticker order is preserved.
pub fn merge_positions(positions: Vec<Position>) -> Vec<Position> {
    let mut order: Vec<String> = Vec::new();
    let mut by_ticker: HashMap<String, Vec<Position>> = HashMap::new();

    for pos in positions {
        if !by_ticker.contains_key(&pos.ticker) {
            order.push(pos.ticker.clone());
        }
        by_ticker.entry(pos.ticker.clone()).or_default().push(pos);
    }

    let mut merged = Vec::with_capacity(order.len());
    for ticker in order {
        let group = by_ticker.remove(&ticker).unwrap_or_default();
        if group.len() == 1 {
            merged.extend(group);
            continue;
        }

        let base = &group[0];
        let total_qty: f64 = group.iter().map(|p| p.quantity).sum();
        let total_mv: f64 = group.iter().map(|p| p.market_value).sum();
        let total_day_pnl: f64 = group.iter().map(|p| p.day_pnl).sum();
        let total_unrealized: f64 = group.iter().map(|p| p.unrealized_pnl).sum();

        // Weighted average cost over positions that report one
        let mut cost_sum = 0.0;
        let mut qty_sum = 0.0;
        for p in &group {
            if let Some(cost) = p.avg_cost {
                if p.quantity > 0.0 {
                    cost_sum += cost * p.quantity;
                    qty_sum += p.quantity;
                }
            }
        }
        let avg_cost = if qty_sum > 0.0 {
            Some(cost_sum / qty_sum)
        } else {
            base.avg_cost
        };

        let (current_price, prev_close) = group
            .iter()
            .find(|p| p.current_price.is_some())
            .map(|p| (p.current_price, p.prev_close))
            .unwrap_or((None, None));

        let unrealized_pct = match (avg_cost, current_price) {
            (Some(cost), Some(price)) if cost > 0.0 => (price - cost) / cost,
            _ => 0.0,
        };

        // Day return from the merged start-of-day value
        let day_pnl_pct = {
            let start_val = total_mv - total_day_pnl;
            if total_mv > 0.0 && total_day_pnl != 0.0 && start_val > 0.0 {
                total_day_pnl / start_val
            } else {
                0.0
            }
        };

        merged.push(Position {
            ticker: ticker.clone(),
            name: base.name.clone(),
            quantity: total_qty,
            avg_cost,
            current_price,
            prev_close,
            market_value: total_mv,
            unrealized_pnl: total_unrealized,
            unrealized_pnl_pct: unrealized_pct,
            day_pnl: total_day_pnl,
            day_pnl_pct,
            weight: 0.0,
            source: group
                .iter()
                .map(|p| p.source.as_str())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("+"),
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::DemoSource;

    struct FailingSource;

    impl PortfolioSource for FailingSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn fetch(&mut self) -> Result<Portfolio> {
            Err(Error::Source("connection refused".to_string()))
        }
    }

    struct FixedSource {
        name: &'static str,
        portfolio: Portfolio,
    }

    impl PortfolioSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&mut self) -> Result<Portfolio> {
            Ok(self.portfolio.clone())
        }
    }

    fn account(name: &'static str, ticker: &str, qty: f64, cost: f64, mv: f64) -> FixedSource {
        let mut portfolio = Portfolio::new();
        let mut pos = Position::new(ticker, qty, mv);
        pos.avg_cost = Some(cost);
        pos.source = name.to_string();
        portfolio.positions.push(pos);
        portfolio.net_assets = mv;
        portfolio.market_value = mv;
        portfolio.source = name.to_string();
        FixedSource { name, portfolio }
    }

    #[test]
    fn test_aggregate_merges_duplicate_tickers() {
        let mut sources: Vec<Box<dyn PortfolioSource>> = vec![
            Box::new(account("alpha", "AAPL", 10.0, 150.0, 2000.0)),
            Box::new(account("beta", "AAPL", 10.0, 170.0, 2000.0)),
        ];

        let merged = aggregate_portfolios(&mut sources).unwrap();
        assert_eq!(merged.position_count(), 1);
        assert_eq!(merged.source, "alpha+beta");

        let pos = &merged.positions[0];
        assert_eq!(pos.quantity, 20.0);
        assert_eq!(pos.market_value, 4000.0);
        // (10 * 150 + 10 * 170) / 20 = 160
        assert_eq!(pos.avg_cost, Some(160.0));
        assert_eq!(pos.source, "alpha+beta");
        assert!((pos.weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_skips_failed_sources() {
        let mut sources: Vec<Box<dyn PortfolioSource>> = vec![
            Box::new(FailingSource),
            Box::new(DemoSource::new()),
        ];

        let merged = aggregate_portfolios(&mut sources).unwrap();
        assert_eq!(merged.source, "demo");
        assert_eq!(merged.position_count(), 5);
    }

    #[test]
    fn test_aggregate_all_failed_is_error() {
        let mut sources: Vec<Box<dyn PortfolioSource>> =
            vec![Box::new(FailingSource), Box::new(FailingSource)];
        assert!(matches!(
            aggregate_portfolios(&mut sources),
            Err(Error::Source(_))
        ));
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let positions = vec![
            Position::new("NVDA", 1.0, 100.0),
            Position::new("AAPL", 1.0, 100.0),
            Position::new("NVDA", 1.0, 100.0),
        ];
        let merged = merge_positions(positions);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].ticker, "NVDA");
        assert_eq!(merged[0].quantity, 2.0);
        assert_eq!(merged[1].ticker, "AAPL");
    }

    #[test]
    fn test_merge_day_pnl_pct() {
        let mut a = Position::new("AAPL", 10.0, 1050.0);
        a.day_pnl = 50.0;
        let mut b = Position::new("AAPL", 10.0, 1050.0);
        b.day_pnl = 50.0;

        let merged = merge_positions(vec![a, b]);
        // 100 gained on a 2000 start-of-day value = 5%
        assert!((merged[0].day_pnl_pct - 0.05).abs() < 1e-9);
    }
}
