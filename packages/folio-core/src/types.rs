//! Core data types for the Folio monitoring toolkit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position in the portfolio as reported by a portfolio source.
///
/// One immutable snapshot per evaluation cycle; the monitor never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Stock ticker symbol (uppercase)
    pub ticker: String,
    /// Display name (if the source provides one)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Number of shares/units held
    pub quantity: f64,
    /// Average cost per share
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cost: Option<f64>,
    /// Latest traded price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_close: Option<f64>,
    /// Current market value
    pub market_value: f64,
    /// Unrealized gain/loss in currency units
    #[serde(default)]
    pub unrealized_pnl: f64,
    /// Unrealized gain/loss as a fraction of cost
    #[serde(default)]
    pub unrealized_pnl_pct: f64,
    /// Day gain/loss in currency units
    #[serde(default)]
    pub day_pnl: f64,
    /// Day-over-day return fraction (0.05 = +5%)
    #[serde(default)]
    pub day_pnl_pct: f64,
    /// Fraction of portfolio net assets (0..1)
    #[serde(default)]
    pub weight: f64,
    /// Which source reported this position
    #[serde(default)]
    pub source: String,
}

impl Position {
    /// Create a new position with the given ticker, quantity, and market value.
    pub fn new(ticker: &str, quantity: f64, market_value: f64) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            name: None,
            quantity,
            avg_cost: None,
            current_price: None,
            prev_close: None,
            market_value,
            unrealized_pnl: 0.0,
            unrealized_pnl_pct: 0.0,
            day_pnl: 0.0,
            day_pnl_pct: 0.0,
            weight: 0.0,
            source: String::new(),
        }
    }

    /// Set the day P&L figures.
    pub fn with_day_pnl(mut self, day_pnl: f64, day_pnl_pct: f64) -> Self {
        self.day_pnl = day_pnl;
        self.day_pnl_pct = day_pnl_pct;
        self
    }

    /// Set the portfolio weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// A portfolio snapshot: positions plus account-level aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Portfolio {
    /// All positions in the account
    pub positions: Vec<Position>,
    /// Cash balance
    pub cash: f64,
    /// Total net asset value
    pub net_assets: f64,
    /// Total market value of positions
    pub market_value: f64,
    /// Available buying power
    #[serde(default)]
    pub buying_power: f64,
    /// Aggregate day gain/loss in currency units
    #[serde(default)]
    pub day_pnl: f64,
    /// Aggregate day gain/loss as a fraction of net assets
    #[serde(default)]
    pub day_pnl_pct: f64,
    /// Account currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Which source(s) produced this snapshot
    #[serde(default)]
    pub source: String,
    /// When the snapshot was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Portfolio {
    /// Create a new empty portfolio.
    pub fn new() -> Self {
        Self {
            currency: default_currency(),
            ..Default::default()
        }
    }

    /// Get the number of positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions ordered by descending weight (rank 1 = largest holding).
    pub fn sorted_by_weight(&self) -> Vec<&Position> {
        let mut sorted: Vec<&Position> = self.positions.iter().collect();
        sorted.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Positions ordered by descending absolute day P&L.
    pub fn top_day_movers(&self, n: usize) -> Vec<&Position> {
        let mut sorted: Vec<&Position> = self.positions.iter().collect();
        sorted.sort_by(|a, b| {
            b.day_pnl
                .abs()
                .partial_cmp(&a.day_pnl.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }

    /// Recompute every position weight as market_value / net_assets.
    pub fn recompute_weights(&mut self) {
        if self.net_assets <= 0.0 {
            return;
        }
        for pos in &mut self.positions {
            pos.weight = pos.market_value / self.net_assets;
        }
    }
}

/// What kind of condition an alert reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A single position moved past its price threshold
    PriceMove,
    /// Aggregate portfolio P&L crossed the trigger
    PnlThreshold,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::PriceMove => "price_move",
            AlertKind::PnlThreshold => "pnl_threshold",
        }
    }
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Informational - within normal range
    Info,
    /// Warning - threshold crossed
    Warning,
    /// Critical - twice the threshold crossed
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single alert produced by the monitor.
///
/// Created fresh each evaluation cycle; never persisted by the core
/// (collaborators may forward or store it).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// What condition fired
    pub kind: AlertKind,
    /// How severe the crossing is
    pub severity: AlertSeverity,
    /// Short human-readable headline
    pub title: String,
    /// Longer human-readable detail
    pub message: String,
    /// Ticker for per-position alerts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    /// The observed value that triggered the alert
    pub value: f64,
    /// The threshold that was crossed
    pub threshold: f64,
    /// Free-form metadata (rank, weight, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// When the alert was created
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert.
    pub fn new(
        kind: AlertKind,
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        value: f64,
        threshold: f64,
    ) -> Self {
        Self {
            kind,
            severity,
            title: title.into(),
            message: message.into(),
            ticker: None,
            value,
            threshold,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a ticker to the alert.
    pub fn with_ticker(mut self, ticker: &str) -> Self {
        self.ticker = Some(ticker.to_uppercase());
        self
    }

    /// Attach metadata to the alert.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Risk metrics for a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Confidence level used for VaR calculation (e.g., 0.95 for 95%)
    pub confidence_level: f64,
    /// Value at Risk in currency units
    pub var: f64,
    /// Value at Risk as percentage of portfolio
    pub var_percent: f64,
    /// Conditional VaR (Expected Shortfall) in currency units
    pub cvar: f64,
    /// Conditional VaR as percentage of portfolio
    pub cvar_percent: f64,
    /// Sharpe ratio (annualized risk-adjusted return)
    pub sharpe_ratio: f64,
    /// Sortino ratio (downside risk-adjusted return)
    pub sortino_ratio: f64,
    /// Maximum drawdown percentage
    pub max_drawdown_percent: f64,
    /// Annualized volatility percentage
    pub volatility_percent: f64,
    /// Daily mean return percentage
    pub daily_mean_return_percent: f64,
    /// Total portfolio value used in calculations
    pub total_portfolio_value: f64,
}

/// Portfolio concentration metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationMetrics {
    /// Herfindahl-Hirschman index over position weights (0..1)
    pub hhi: f64,
    /// Combined weight of the five largest positions
    pub top_5_weight: f64,
    /// Ticker of the largest position
    pub max_position_ticker: String,
    /// Weight of the largest position
    pub max_position_weight: f64,
}

/// API response wrapper for CLI/bridge output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new("tqqq", 100.0, 6500.0);
        assert_eq!(pos.ticker, "TQQQ");
        assert_eq!(pos.quantity, 100.0);
        assert_eq!(pos.market_value, 6500.0);
        assert!(pos.current_price.is_none());
    }

    #[test]
    fn test_sorted_by_weight() {
        let mut portfolio = Portfolio::new();
        portfolio
            .positions
            .push(Position::new("AAPL", 10.0, 1500.0).with_weight(0.15));
        portfolio
            .positions
            .push(Position::new("NVDA", 5.0, 4000.0).with_weight(0.40));
        portfolio
            .positions
            .push(Position::new("GOOGL", 5.0, 1000.0).with_weight(0.10));

        let sorted = portfolio.sorted_by_weight();
        assert_eq!(sorted[0].ticker, "NVDA");
        assert_eq!(sorted[1].ticker, "AAPL");
        assert_eq!(sorted[2].ticker, "GOOGL");
    }

    #[test]
    fn test_top_day_movers() {
        let mut portfolio = Portfolio::new();
        portfolio
            .positions
            .push(Position::new("AAPL", 10.0, 1500.0).with_day_pnl(-50.0, -0.03));
        portfolio
            .positions
            .push(Position::new("NVDA", 5.0, 4000.0).with_day_pnl(300.0, 0.08));
        portfolio
            .positions
            .push(Position::new("GOOGL", 5.0, 1000.0).with_day_pnl(-120.0, -0.11));

        let movers = portfolio.top_day_movers(2);
        assert_eq!(movers.len(), 2);
        assert_eq!(movers[0].ticker, "NVDA");
        assert_eq!(movers[1].ticker, "GOOGL");
    }

    #[test]
    fn test_recompute_weights() {
        let mut portfolio = Portfolio::new();
        portfolio.net_assets = 10000.0;
        portfolio.positions.push(Position::new("AAPL", 10.0, 2500.0));
        portfolio.positions.push(Position::new("NVDA", 5.0, 7500.0));

        portfolio.recompute_weights();
        assert!((portfolio.positions[0].weight - 0.25).abs() < 1e-12);
        assert!((portfolio.positions[1].weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_alert_builder() {
        let alert = Alert::new(
            AlertKind::PriceMove,
            AlertSeverity::Warning,
            "TQQQ down 6.0%",
            "details",
            -0.06,
            0.05,
        )
        .with_ticker("tqqq")
        .with_metadata(serde_json::json!({"rank": 1}));

        assert_eq!(alert.ticker.as_deref(), Some("TQQQ"));
        assert_eq!(alert.metadata.unwrap()["rank"], 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Info < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Critical);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
