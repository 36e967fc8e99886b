//! Portfolio price-movement and P&L alert evaluation.

use crate::config::{Config, LeveragedEtf};
use crate::monitor::{DedupState, StateFile};
use crate::types::{Alert, AlertKind, AlertSeverity, Portfolio, Position};
use crate::Result;
use serde_json::json;
use std::collections::HashMap;

/// Ranks that get the tighter "top holdings" threshold.
const TOP_WEIGHT_RANKS: usize = 10;

/// Monitor for price movement and aggregate P&L alerts.
///
/// Supports step-based deduplication: an alert fires when a threshold is
/// first crossed, then only fires again when the value crosses the next
/// step boundary (every additional `move_step` of change, or every
/// additional `pnl_step` of day P&L).
#[derive(Debug, Clone)]
pub struct PriceMonitor {
    /// Day-move threshold for the ten largest positions (fraction)
    pub top10_threshold: f64,
    /// Day-move threshold for all other positions (fraction)
    pub other_threshold: f64,
    /// Aggregate day P&L trigger in currency units
    pub pnl_trigger: f64,
    /// Dedup step for price moves (fraction)
    pub move_step: f64,
    /// Dedup step for aggregate P&L (currency units)
    pub pnl_step: f64,
    /// Leveraged instrument registry: ticker -> (underlying, leverage, label)
    pub leveraged_etfs: HashMap<String, LeveragedEtf>,
}

impl Default for PriceMonitor {
    fn default() -> Self {
        Self {
            top10_threshold: 0.05,
            other_threshold: 0.10,
            pnl_trigger: 500.0,
            move_step: 0.01,
            pnl_step: 500.0,
            leveraged_etfs: HashMap::new(),
        }
    }
}

impl PriceMonitor {
    /// Create a monitor from config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            top10_threshold: config.alerts.single_stock_threshold_top10,
            other_threshold: config.alerts.single_stock_threshold_other,
            pnl_trigger: config.alerts.pnl_trigger,
            move_step: config.alerts.move_step,
            pnl_step: config.alerts.pnl_step,
            leveraged_etfs: config.leveraged_etfs.clone(),
        }
    }

    /// Effective alert threshold for a ticker, rescaled for leveraged funds.
    ///
    /// A 3x leveraged fund is expected to move ~3x as much as its underlying
    /// for the same surprise, so a 5% base threshold becomes 15%.
    pub fn effective_threshold(&self, ticker: &str, base_threshold: f64) -> f64 {
        match self.leveraged_etfs.get(ticker) {
            Some(etf) => base_threshold * etf.leverage.abs(),
            None => base_threshold,
        }
    }

    /// Evaluate one portfolio snapshot against the thresholds.
    ///
    /// Pure apart from the supplied dedup state: positions are checked in
    /// descending-weight order, then the aggregate P&L; price alerts precede
    /// the aggregate alert in the returned list. Keys whose metric sits
    /// below threshold are cleared from `state` so a later crossing fires
    /// again from step 0.
    pub fn check_portfolio(&self, portfolio: &Portfolio, state: &mut DedupState) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (i, pos) in portfolio.sorted_by_weight().iter().enumerate() {
            let rank = i + 1;
            let base_threshold = if rank <= TOP_WEIGHT_RANKS {
                self.top10_threshold
            } else {
                self.other_threshold
            };
            let threshold = self.effective_threshold(&pos.ticker, base_threshold);
            let magnitude = pos.day_pnl_pct.abs();
            let key = DedupState::price_key(&pos.ticker);

            if magnitude >= threshold {
                if !state.should_alert(&key, magnitude, threshold, self.move_step) {
                    continue;
                }

                let severity = if magnitude >= threshold * 2.0 {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                };

                alerts.push(
                    Alert::new(
                        AlertKind::PriceMove,
                        severity,
                        self.price_title(pos),
                        Self::price_message(pos, rank),
                        pos.day_pnl_pct,
                        threshold,
                    )
                    .with_ticker(&pos.ticker)
                    .with_metadata(json!({"rank": rank, "weight": pos.weight})),
                );
            } else {
                // Below threshold: clear any saved state so it can re-fire
                state.clear(&key);
            }
        }

        let pnl = portfolio.day_pnl;
        if pnl.abs() >= self.pnl_trigger {
            if state.should_alert(DedupState::PNL_KEY, pnl.abs(), self.pnl_trigger, self.pnl_step)
            {
                let severity = if pnl.abs() >= self.pnl_trigger * 2.0 {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                };
                let is_gain = pnl > 0.0;

                alerts.push(Alert::new(
                    AlertKind::PnlThreshold,
                    severity,
                    format!(
                        "Portfolio {} ${:.0} today",
                        if is_gain { "gained" } else { "lost" },
                        pnl.abs()
                    ),
                    Self::pnl_message(portfolio, is_gain),
                    pnl,
                    self.pnl_trigger,
                ));
            }
        } else {
            state.clear(DedupState::PNL_KEY);
        }

        alerts
    }

    /// Run one full monitoring cycle against a persisted state file.
    ///
    /// Loads the dedup state (fail-open on missing/corrupt), evaluates the
    /// portfolio, then saves the updated state. A failed save propagates to
    /// the caller; the alert list is already computed at that point, so a
    /// caller that wants it despite the failure can use [`StateFile::load`]
    /// and [`Self::check_portfolio`] directly.
    pub fn check_and_persist(&self, portfolio: &Portfolio, store: &StateFile) -> Result<Vec<Alert>> {
        let mut state = store.load();
        let alerts = self.check_portfolio(portfolio, &mut state);
        store.save(&state)?;
        Ok(alerts)
    }

    fn price_title(&self, pos: &Position) -> String {
        let direction = if pos.day_pnl_pct > 0.0 { "up" } else { "down" };
        let etf_note = match self.leveraged_etfs.get(&pos.ticker) {
            Some(etf) => format!(" ({}x {})", etf.leverage.abs(), etf.label),
            None => String::new(),
        };
        format!(
            "{}{} {} {:.1}%",
            pos.ticker,
            etf_note,
            direction,
            pos.day_pnl_pct.abs() * 100.0
        )
    }

    fn price_message(pos: &Position, rank: usize) -> String {
        let direction = if pos.day_pnl_pct > 0.0 { "up" } else { "down" };
        format!(
            "{} (rank #{}, {:.1}% of portfolio) is {} {:.1}% today. Day P&L: ${:.2}",
            pos.ticker,
            rank,
            pos.weight * 100.0,
            direction,
            pos.day_pnl_pct.abs() * 100.0,
            pos.day_pnl
        )
    }

    fn pnl_message(portfolio: &Portfolio, is_gain: bool) -> String {
        let contributors: Vec<String> = portfolio
            .top_day_movers(3)
            .iter()
            .map(|p| {
                let sign = if p.day_pnl > 0.0 { "+" } else { "" };
                format!("{}: {}${:.0}", p.ticker, sign, p.day_pnl)
            })
            .collect();

        format!(
            "Total day P&L: {}${:.2} ({:+.2}%)\nTop contributors: {}",
            if is_gain { "+" } else { "-" },
            portfolio.day_pnl.abs(),
            portfolio.day_pnl_pct * 100.0,
            contributors.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_leveraged_etfs;
    use tempfile::tempdir;

    fn monitor() -> PriceMonitor {
        PriceMonitor {
            leveraged_etfs: default_leveraged_etfs(),
            ..Default::default()
        }
    }

    fn single_position_portfolio(ticker: &str, day_pct: f64) -> Portfolio {
        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 100_000.0;
        portfolio.positions.push(
            Position::new(ticker, 100.0, 20_000.0)
                .with_weight(0.20)
                .with_day_pnl(20_000.0 * day_pct, day_pct),
        );
        portfolio
    }

    #[test]
    fn test_effective_threshold_leveraged() {
        let m = monitor();
        assert!((m.effective_threshold("TQQQ", 0.05) - 0.15).abs() < 1e-12);
        // Inverse funds rescale by the absolute multiplier
        assert!((m.effective_threshold("SQQQ", 0.05) - 0.15).abs() < 1e-12);
        assert_eq!(m.effective_threshold("AAPL", 0.05), 0.05);
    }

    #[test]
    fn test_leverage_rescaling_suppresses_ordinary_moves() {
        let m = monitor();
        let mut state = DedupState::new();

        // 3x fund moving 10% is ordinary noise against a 15% effective threshold
        let quiet = single_position_portfolio("TQQQ", -0.10);
        assert!(m.check_portfolio(&quiet, &mut state).is_empty());

        // 20% is a real move
        let loud = single_position_portfolio("TQQQ", -0.20);
        let alerts = m.check_portfolio(&loud, &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].ticker.as_deref(), Some("TQQQ"));
    }

    #[test]
    fn test_idempotent_under_unchanged_input() {
        let m = monitor();
        let mut state = DedupState::new();
        let portfolio = single_position_portfolio("AAPL", -0.052);

        let first = m.check_portfolio(&portfolio, &mut state);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].severity, AlertSeverity::Warning);

        let second = m.check_portfolio(&portfolio, &mut state);
        assert!(second.is_empty());
    }

    #[test]
    fn test_monotonic_refire_one_step() {
        let m = monitor();
        let mut state = DedupState::new();

        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", 0.05), &mut state);
        assert_eq!(alerts.len(), 1);

        // threshold + 1.5 * move_step: exactly one more alert
        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", 0.065), &mut state);
        assert_eq!(alerts.len(), 1);

        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", 0.065), &mut state);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_five_call_scenario() {
        let m = monitor();
        let mut state = DedupState::new();

        // First call: -5.2% -> one warning, step 0 recorded
        let alerts = m.check_portfolio(&single_position_portfolio("TICK", -0.052), &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(state.last_step("price:TICK"), Some(0));

        // Second call, same pct: suppressed
        let alerts = m.check_portfolio(&single_position_portfolio("TICK", -0.052), &mut state);
        assert!(alerts.is_empty());

        // Third call: -6.3% crosses step 1
        let alerts = m.check_portfolio(&single_position_portfolio("TICK", -0.063), &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(state.last_step("price:TICK"), Some(1));

        // Fourth call: -2% drops below threshold, state cleared
        let alerts = m.check_portfolio(&single_position_portfolio("TICK", -0.02), &mut state);
        assert!(alerts.is_empty());
        assert_eq!(state.last_step("price:TICK"), None);

        // Fifth call: -6% fires again from step 0
        let alerts = m.check_portfolio(&single_position_portfolio("TICK", -0.06), &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(state.last_step("price:TICK"), Some(0));
    }

    #[test]
    fn test_severity_escalation() {
        let m = monitor();

        let mut state = DedupState::new();
        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", -0.09), &mut state);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);

        let mut state = DedupState::new();
        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", -0.10), &mut state);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_disabled_dedup_fires_every_cycle() {
        let m = PriceMonitor {
            move_step: 0.0,
            ..Default::default()
        };
        let mut state = DedupState::new();
        let portfolio = single_position_portfolio("AAPL", -0.06);

        assert_eq!(m.check_portfolio(&portfolio, &mut state).len(), 1);
        assert_eq!(m.check_portfolio(&portfolio, &mut state).len(), 1);
        assert!(state.is_empty());
    }

    #[test]
    fn test_rank_threshold_selection() {
        let m = monitor();
        let mut state = DedupState::new();

        // Eleven positions; the smallest holding ranks 11th and gets the
        // looser 10% threshold, so a 6% move there stays quiet while the
        // same move on a top-10 name fires.
        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 120_000.0;
        for i in 0..10 {
            portfolio.positions.push(
                Position::new(&format!("BIG{}", i), 10.0, 11_000.0).with_weight(0.09),
            );
        }
        portfolio.positions.push(
            Position::new("TINY", 10.0, 1_000.0)
                .with_weight(0.008)
                .with_day_pnl(-60.0, -0.06),
        );

        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert!(alerts.is_empty());

        // Same move on the largest holding crosses its 5% threshold
        portfolio.positions[0].day_pnl_pct = -0.06;
        portfolio.positions[0].day_pnl = -660.0;
        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].ticker.as_deref(), Some("BIG0"));
    }

    #[test]
    fn test_pnl_alert_and_contributors() {
        let m = monitor();
        let mut state = DedupState::new();

        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 100_000.0;
        portfolio.day_pnl = -750.0;
        portfolio.day_pnl_pct = -0.0075;
        portfolio.positions.push(
            Position::new("AAPL", 10.0, 30_000.0)
                .with_weight(0.30)
                .with_day_pnl(-500.0, -0.016),
        );
        portfolio.positions.push(
            Position::new("NVDA", 10.0, 30_000.0)
                .with_weight(0.30)
                .with_day_pnl(-250.0, -0.008),
        );

        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.kind, AlertKind::PnlThreshold);
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert!(alert.title.contains("lost"));
        assert!(alert.message.contains("AAPL"));
        assert_eq!(alert.threshold, 500.0);

        // Doubling the loss escalates to critical on a new step
        portfolio.day_pnl = -1500.0;
        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_price_alerts_precede_pnl_alert() {
        let m = monitor();
        let mut state = DedupState::new();

        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 100_000.0;
        portfolio.day_pnl = 900.0;
        portfolio.day_pnl_pct = 0.009;
        portfolio.positions.push(
            Position::new("AAPL", 10.0, 30_000.0)
                .with_weight(0.30)
                .with_day_pnl(900.0, 0.07),
        );

        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::PriceMove);
        assert_eq!(alerts[1].kind, AlertKind::PnlThreshold);
    }

    #[test]
    fn test_reranking_does_not_reset_steps() {
        let m = monitor();
        let mut state = DedupState::new();

        // AAPL fires at rank 1 with the 5% threshold
        let alerts = m.check_portfolio(&single_position_portfolio("AAPL", -0.06), &mut state);
        assert_eq!(alerts.len(), 1);
        let step = state.last_step("price:AAPL");

        // Same magnitude after reweighting: still keyed by ticker, no re-fire
        let mut portfolio = single_position_portfolio("AAPL", -0.06);
        portfolio.positions[0].weight = 0.01;
        let alerts = m.check_portfolio(&portfolio, &mut state);
        assert!(alerts.is_empty());
        assert_eq!(state.last_step("price:AAPL"), step);
    }

    #[test]
    fn test_check_and_persist_roundtrip() {
        let dir = tempdir().unwrap();
        let store = StateFile::with_path(dir.path().join("state.json"));
        let m = monitor();
        let portfolio = single_position_portfolio("AAPL", -0.052);

        let alerts = m.check_and_persist(&portfolio, &store).unwrap();
        assert_eq!(alerts.len(), 1);

        // Second cycle reads the persisted step and stays quiet
        let alerts = m.check_and_persist(&portfolio, &store).unwrap();
        assert!(alerts.is_empty());

        // Recovery drops the key from the file
        let calm = single_position_portfolio("AAPL", -0.01);
        m.check_and_persist(&calm, &store).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_leveraged_title_annotation() {
        let m = monitor();
        let mut state = DedupState::new();
        let alerts = m.check_portfolio(&single_position_portfolio("TQQQ", -0.20), &mut state);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].title.contains("3x Nasdaq-100 Bull"));
        assert!(alerts[0].title.contains("down 20.0%"));
    }
}
