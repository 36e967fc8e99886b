//! Folio CLI - portfolio monitoring from the command line.
//!
//! All output is JSON `ApiResponse` envelopes for easy scripting.

use clap::{Parser, Subcommand};
use folio_core::analysis::{calculate_rebalance, propose_dca_allocation, stress_test_portfolio, TargetAllocation};
use folio_core::config::Config;
use folio_core::monitor::{PriceMonitor, StateFile};
use folio_core::portfolio::{
    aggregate_portfolios, calculate_risk_metrics, compute_performance, daily_returns,
    filter_by_period, portfolio_concentration, DemoSource, HistoryFile, JsonFileSource,
    PortfolioSource,
};
use folio_core::types::{Alert, AlertSeverity, ApiResponse, Portfolio};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio CLI - portfolio monitoring and alerts")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/folio/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Portfolio snapshot JSON file (repeatable; merged when repeated)
    #[arg(short, long, global = true)]
    portfolio: Vec<PathBuf>,

    /// Use the built-in demo portfolio
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alert monitor over the portfolio
    Alerts {
        /// Filter by severity (info, warning, critical)
        #[arg(short, long)]
        severity: Option<String>,
        /// Send triggered alerts to Telegram (requires the notify build)
        #[arg(long)]
        notify: bool,
    },
    /// Show portfolio summary
    Summary {
        /// Number of top holdings to show
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },
    /// Calculate risk metrics from snapshot history
    Risk {
        /// Confidence level for VaR (0.95 = 95%)
        #[arg(long)]
        confidence: Option<f64>,
    },
    /// Run stress scenarios against the portfolio
    Stress,
    /// Rebalance analysis against target allocations
    Rebalance {
        /// JSON file with [{"ticker": "SPY", "weight": 0.5}, ...]
        #[arg(short, long)]
        targets: PathBuf,
        /// Deviation tolerance before flagging
        #[arg(long, default_value = "0.03")]
        tolerance: f64,
        /// Propose buys-only allocation of this DCA amount instead
        #[arg(long)]
        dca: Option<f64>,
    },
    /// Snapshot history commands
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Append today's snapshot to the journal
    Snapshot,
    /// Performance summary over the journal
    Performance {
        /// Period: 1m, 3m, 6m, 1y, all
        #[arg(short, long, default_value = "all")]
        period: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string())).unwrap()
            );
            std::process::exit(1);
        }
    };

    let output = match &cli.command {
        Commands::Alerts { severity, notify } => handle_alerts(&cli, &config, severity.as_deref(), *notify),
        Commands::Summary { top } => handle_summary(&cli, *top),
        Commands::Risk { confidence } => handle_risk(&cli, &config, *confidence),
        Commands::Stress => handle_stress(&cli, &config),
        Commands::Rebalance {
            targets,
            tolerance,
            dca,
        } => handle_rebalance(&cli, targets, *tolerance, *dca),
        Commands::History { action } => handle_history(&cli, action),
    };

    println!("{}", output);
}

fn fetch_portfolio(cli: &Cli) -> folio_core::Result<Portfolio> {
    let mut sources: Vec<Box<dyn PortfolioSource>> = Vec::new();
    for path in &cli.portfolio {
        sources.push(Box::new(JsonFileSource::new(path)));
    }
    if cli.demo || sources.is_empty() {
        sources.push(Box::new(DemoSource::new()));
    }
    aggregate_portfolios(&mut sources)
}

fn err_json(e: impl ToString) -> String {
    serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string())).unwrap()
}

fn parse_severity(s: &str) -> Option<AlertSeverity> {
    match s {
        "info" => Some(AlertSeverity::Info),
        "warning" => Some(AlertSeverity::Warning),
        "critical" => Some(AlertSeverity::Critical),
        _ => None,
    }
}

fn handle_alerts(cli: &Cli, config: &Config, severity: Option<&str>, notify: bool) -> String {
    let portfolio = match fetch_portfolio(cli) {
        Ok(portfolio) => portfolio,
        Err(e) => return err_json(e),
    };

    let severity = match severity {
        Some(s) => match parse_severity(s) {
            Some(severity) => Some(severity),
            None => return err_json(format!("unknown severity: {}", s)),
        },
        None => None,
    };

    let monitor = PriceMonitor::from_config(config);
    let mut alerts = match monitor.check_and_persist(&portfolio, &StateFile::new()) {
        Ok(alerts) => alerts,
        Err(e) => return err_json(e),
    };

    if let Some(severity) = severity {
        alerts.retain(|a| a.severity == severity);
    }

    if notify && !alerts.is_empty() {
        if let Err(e) = send_telegram(config, &alerts) {
            return err_json(e);
        }
    }

    serde_json::to_string_pretty(&ApiResponse::ok(json!({
        "alerts": alerts,
        "count": alerts.len(),
        "portfolio_source": portfolio.source,
    })))
    .unwrap()
}

#[cfg(feature = "notify")]
fn send_telegram(config: &Config, alerts: &[Alert]) -> folio_core::Result<()> {
    use folio_core::notify::{format_alerts_telegram, TelegramNotifier};
    use folio_core::Error;

    let token = config
        .notify
        .telegram_bot_token
        .as_deref()
        .ok_or_else(|| Error::Notify("telegram_bot_token not configured".to_string()))?;
    let chat_id = config
        .notify
        .telegram_chat_id
        .as_deref()
        .ok_or_else(|| Error::Notify("telegram_chat_id not configured".to_string()))?;

    TelegramNotifier::new(token, chat_id)?.send_message(&format_alerts_telegram(alerts))
}

#[cfg(not(feature = "notify"))]
fn send_telegram(_config: &Config, _alerts: &[Alert]) -> folio_core::Result<()> {
    Err(folio_core::Error::Notify(
        "this build has no notification transport (enable the `notify` feature)".to_string(),
    ))
}

fn handle_summary(cli: &Cli, top: usize) -> String {
    let portfolio = match fetch_portfolio(cli) {
        Ok(portfolio) => portfolio,
        Err(e) => return err_json(e),
    };

    let holdings: Vec<_> = portfolio
        .sorted_by_weight()
        .into_iter()
        .take(top)
        .cloned()
        .collect();

    serde_json::to_string_pretty(&ApiResponse::ok(json!({
        "net_assets": portfolio.net_assets,
        "market_value": portfolio.market_value,
        "cash": portfolio.cash,
        "day_pnl": portfolio.day_pnl,
        "day_pnl_pct": portfolio.day_pnl_pct,
        "position_count": portfolio.position_count(),
        "source": portfolio.source,
        "top_holdings": holdings,
    })))
    .unwrap()
}

fn handle_risk(cli: &Cli, config: &Config, confidence: Option<f64>) -> String {
    let portfolio = match fetch_portfolio(cli) {
        Ok(portfolio) => portfolio,
        Err(e) => return err_json(e),
    };

    let rows = match HistoryFile::new().read_snapshots() {
        Ok(rows) => rows,
        Err(e) => return err_json(e),
    };
    let navs: Vec<f64> = rows.iter().map(|r| r.net_assets).collect();
    let returns = daily_returns(&navs);

    let confidence = confidence.unwrap_or(config.risk.confidence);
    let metrics = match calculate_risk_metrics(
        &returns,
        portfolio.net_assets,
        confidence,
        config.risk.risk_free_rate,
    ) {
        Ok(metrics) => metrics,
        Err(e) => return err_json(e),
    };

    serde_json::to_string_pretty(&ApiResponse::ok(json!({
        "metrics": metrics,
        "concentration": portfolio_concentration(&portfolio),
        "history_days": returns.len(),
    })))
    .unwrap()
}

fn handle_stress(cli: &Cli, config: &Config) -> String {
    let portfolio = match fetch_portfolio(cli) {
        Ok(portfolio) => portfolio,
        Err(e) => return err_json(e),
    };

    let results = stress_test_portfolio(&portfolio, &config.leveraged_etfs, None);
    serde_json::to_string_pretty(&ApiResponse::ok(json!({ "scenarios": results }))).unwrap()
}

fn handle_rebalance(cli: &Cli, targets: &PathBuf, tolerance: f64, dca: Option<f64>) -> String {
    let portfolio = match fetch_portfolio(cli) {
        Ok(portfolio) => portfolio,
        Err(e) => return err_json(e),
    };

    let targets: Vec<TargetAllocation> = match std::fs::read_to_string(targets)
        .map_err(folio_core::Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(folio_core::Error::from))
    {
        Ok(targets) => targets,
        Err(e) => return err_json(e),
    };

    let actions = match dca {
        Some(amount) => propose_dca_allocation(&portfolio, &targets, amount),
        None => calculate_rebalance(&portfolio, &targets, tolerance),
    };

    serde_json::to_string_pretty(&ApiResponse::ok(json!({ "actions": actions }))).unwrap()
}

fn handle_history(cli: &Cli, action: &HistoryAction) -> String {
    let history = HistoryFile::new();

    match action {
        HistoryAction::Snapshot => {
            let portfolio = match fetch_portfolio(cli) {
                Ok(portfolio) => portfolio,
                Err(e) => return err_json(e),
            };
            match history.append_snapshot(&portfolio) {
                Ok(outcome) => {
                    serde_json::to_string_pretty(&ApiResponse::ok(outcome)).unwrap()
                }
                Err(e) => err_json(e),
            }
        }
        HistoryAction::Performance { period } => {
            let rows = match history.read_snapshots() {
                Ok(rows) => rows,
                Err(e) => return err_json(e),
            };
            let filtered = filter_by_period(&rows, period);
            match compute_performance(&filtered) {
                Some(perf) => serde_json::to_string_pretty(&ApiResponse::ok(perf)).unwrap(),
                None => err_json("No snapshot data available."),
            }
        }
    }
}
