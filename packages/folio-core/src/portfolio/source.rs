//! Portfolio snapshot sources.
//!
//! `PortfolioSource` is the seam where broker adapters plug in. The crate
//! ships a JSON-file source (for snapshots exported by any external
//! process) and a fixed demo source; real brokerage transports live behind
//! the same trait in the consuming application.

use crate::types::{Portfolio, Position};
use crate::{Error, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

/// A provider of portfolio snapshots.
pub trait PortfolioSource {
    /// Short name used in logs and the merged portfolio's source tag.
    fn name(&self) -> &str;

    /// Fetch the current snapshot.
    fn fetch(&mut self) -> Result<Portfolio>;
}

/// Reads a portfolio snapshot from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "file".to_string(),
            path: path.into(),
        }
    }
}

impl PortfolioSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&mut self) -> Result<Portfolio> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::Source(format!("read {}: {}", self.path.display(), e))
        })?;
        let mut portfolio: Portfolio = serde_json::from_str(&content)
            .map_err(|e| Error::Source(format!("parse {}: {}", self.path.display(), e)))?;

        if portfolio.source.is_empty() {
            portfolio.source = self.name.clone();
        }
        if portfolio.timestamp.is_none() {
            portfolio.timestamp = Some(Utc::now());
        }
        // Sources exporting raw broker data often omit weights
        if portfolio.positions.iter().all(|p| p.weight == 0.0) {
            portfolio.recompute_weights();
        }

        Ok(portfolio)
    }
}

/// A fixed sample portfolio for demos and CLI smoke tests.
#[derive(Debug, Clone, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }
}

impl PortfolioSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    fn fetch(&mut self) -> Result<Portfolio> {
        let mut portfolio = Portfolio::new();
        portfolio.cash = 12_500.0;
        portfolio.net_assets = 100_000.0;
        portfolio.market_value = 87_500.0;
        portfolio.buying_power = 25_000.0;
        portfolio.day_pnl = -820.0;
        portfolio.day_pnl_pct = -0.0082;
        portfolio.source = self.name().to_string();
        portfolio.timestamp = Some(Utc::now());

        portfolio.positions = vec![
            Position::new("NVDA", 80.0, 28_000.0).with_day_pnl(-620.0, -0.0217),
            Position::new("AAPL", 120.0, 24_000.0).with_day_pnl(150.0, 0.0063),
            Position::new("MSFT", 40.0, 16_500.0).with_day_pnl(-90.0, -0.0054),
            Position::new("TQQQ", 150.0, 10_500.0).with_day_pnl(-360.0, -0.0331),
            Position::new("SCHD", 300.0, 8_000.0).with_day_pnl(100.0, 0.0126),
        ];
        portfolio.recompute_weights();

        Ok(portfolio)
    }
}
