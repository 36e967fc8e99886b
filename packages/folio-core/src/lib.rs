//! Folio Core - Portfolio monitoring and alerting library.
//!
//! This crate provides the core functionality for the Folio toolkit:
//!
//! - **Price monitoring**: threshold alerts with step-based deduplication
//! - **Portfolio aggregation**: merge snapshots from multiple sources
//! - **Risk metrics**: VaR, Sharpe ratio, Sortino ratio, max drawdown, concentration
//! - **Technical indicators**: SMA, EMA, RSI, Bollinger Bands, MACD
//! - **Analysis**: stress scenarios, rebalancing, bubble-risk scoring
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::monitor::{PriceMonitor, StateFile};
//! use folio_core::portfolio::{DemoSource, PortfolioSource};
//!
//! // Fetch a portfolio snapshot (the demo source ships a fixed sample)
//! let mut source = DemoSource::new();
//! let portfolio = source.fetch().expect("demo source");
//!
//! // One monitoring cycle: load dedup state, evaluate, save state
//! let monitor = PriceMonitor::default();
//! let alerts = monitor.check_and_persist(&portfolio, &StateFile::new()).expect("save state");
//! for alert in &alerts {
//!     println!("[{}] {}", alert.severity, alert.title);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod indicators;
pub mod monitor;
pub mod notify;
pub mod portfolio;
pub mod types;

// Re-export commonly used types
pub use types::{
    Alert, AlertKind, AlertSeverity, ApiResponse, ConcentrationMetrics, Portfolio, Position,
    RiskMetrics,
};

// Re-export main functionality
pub use config::{Config, LeveragedEtf};
pub use indicators::{bollinger_bands, ema, macd, rsi, sma, BollingerBands, Macd};
pub use monitor::{DedupState, PriceMonitor, StateFile};
pub use portfolio::{
    aggregate_portfolios, calculate_risk_metrics, portfolio_concentration, HistoryFile,
    PortfolioSource,
};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Portfolio source error: {0}")]
    Source(String),

    #[error("Notification error: {0}")]
    Notify(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
