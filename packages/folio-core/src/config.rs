//! Configuration loading and defaults.
//!
//! Config lives in a TOML file (default `~/.config/folio/config.toml`,
//! overridable with `FOLIO_CONFIG_FILE` or a CLI flag). A missing file means
//! "all defaults"; a malformed file is an error.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Alert thresholds and dedup step sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Day-move threshold for the ten largest positions (fraction)
    pub single_stock_threshold_top10: f64,
    /// Day-move threshold for all other positions (fraction)
    pub single_stock_threshold_other: f64,
    /// Aggregate day P&L trigger in currency units
    pub pnl_trigger: f64,
    /// Dedup step for price moves (fraction); <= 0 disables dedup
    pub move_step: f64,
    /// Dedup step for aggregate P&L (currency units); <= 0 disables dedup
    pub pnl_step: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            single_stock_threshold_top10: 0.05,
            single_stock_threshold_other: 0.10,
            pnl_trigger: 500.0,
            move_step: 0.01,
            pnl_step: 500.0,
        }
    }
}

/// Risk calculation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Confidence level for VaR (0.95 = 95%)
    pub confidence: f64,
    /// Annual risk-free rate (0.04 = 4%)
    pub risk_free_rate: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            risk_free_rate: 0.04,
        }
    }
}

/// Notification transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Telegram bot token ("123456:ABC-...")
    pub telegram_bot_token: Option<String>,
    /// Telegram chat or channel ID
    pub telegram_chat_id: Option<String>,
}

/// A leveraged instrument entry: which benchmark it tracks and by how much.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeveragedEtf {
    /// Ticker of the underlying benchmark
    pub underlying: String,
    /// Signed leverage multiplier (-3.0 for a 3x inverse fund)
    pub leverage: f64,
    /// Human-readable label for alert titles
    pub label: String,
}

impl LeveragedEtf {
    pub fn new(underlying: &str, leverage: f64, label: &str) -> Self {
        Self {
            underlying: underlying.to_string(),
            leverage,
            label: label.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub alerts: AlertConfig,
    pub risk: RiskConfig,
    pub notify: NotifyConfig,
    /// Leveraged instrument registry: ticker -> (underlying, leverage, label).
    /// Entries in the config file are merged over the built-in table.
    pub leveraged_etfs: HashMap<String, LeveragedEtf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alerts: AlertConfig::default(),
            risk: RiskConfig::default(),
            notify: NotifyConfig::default(),
            leveraged_etfs: default_leveraged_etfs(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default: `~/.config/folio/config.toml`.
    /// Can be overridden with the `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load configuration from the given path, or the default path.
    ///
    /// A missing file yields `Config::default()`. File entries under
    /// `[leveraged_etfs]` are merged over the built-in registry.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let mut config: Config = toml::from_str(&content)?;

        let mut registry = default_leveraged_etfs();
        registry.extend(config.leveraged_etfs);
        config.leveraged_etfs = registry;

        Ok(config)
    }
}

/// Built-in leveraged-ETF registry covering the common 2x/3x funds.
pub fn default_leveraged_etfs() -> HashMap<String, LeveragedEtf> {
    let entries = [
        ("TQQQ", "QQQ", 3.0, "Nasdaq-100 Bull"),
        ("SQQQ", "QQQ", -3.0, "Nasdaq-100 Bear"),
        ("QLD", "QQQ", 2.0, "Nasdaq-100 Bull"),
        ("QID", "QQQ", -2.0, "Nasdaq-100 Bear"),
        ("UPRO", "SPY", 3.0, "S&P 500 Bull"),
        ("SPXU", "SPY", -3.0, "S&P 500 Bear"),
        ("SPXS", "SPY", -3.0, "S&P 500 Bear"),
        ("SSO", "SPY", 2.0, "S&P 500 Bull"),
        ("SDS", "SPY", -2.0, "S&P 500 Bear"),
        ("SOXL", "SOXX", 3.0, "Semiconductor Bull"),
        ("SOXS", "SOXX", -3.0, "Semiconductor Bear"),
        ("TNA", "IWM", 3.0, "Small Cap Bull"),
        ("TZA", "IWM", -3.0, "Small Cap Bear"),
        ("FAS", "XLF", 3.0, "Financial Bull"),
        ("FAZ", "XLF", -3.0, "Financial Bear"),
        ("TECL", "XLK", 3.0, "Technology Bull"),
        ("TECS", "XLK", -3.0, "Technology Bear"),
        ("LABU", "XBI", 3.0, "Biotech Bull"),
        ("LABD", "XBI", -3.0, "Biotech Bear"),
    ];

    entries
        .iter()
        .map(|(ticker, underlying, leverage, label)| {
            (
                ticker.to_string(),
                LeveragedEtf::new(underlying, *leverage, label),
            )
        })
        .collect()
}
