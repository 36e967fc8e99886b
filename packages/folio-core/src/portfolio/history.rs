//! Portfolio snapshot history: a daily CSV journal.
//!
//! One row per calendar day, appended idempotently; re-running the snapshot
//! command on the same day is a no-op. The journal is the input for the
//! performance summary and for risk metrics over realized NAVs.

use crate::types::Portfolio;
use crate::Result;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const COLUMNS: &str = "date,net_assets,market_value,cash,day_pnl,day_pnl_pct";

/// A single snapshot entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub date: NaiveDate,
    pub net_assets: f64,
    pub market_value: f64,
    pub cash: f64,
    pub day_pnl: f64,
    pub day_pnl_pct: f64,
}

/// Outcome of an append attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOutcome {
    /// Whether a new row was written
    pub written: bool,
    pub message: String,
}

/// The on-disk snapshot journal.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    /// Create a journal at the default path.
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Create a journal at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default history file path.
    ///
    /// Default: `~/.local/share/folio/history.csv`.
    /// Can be overridden with the `FOLIO_HISTORY_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_HISTORY_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("folio/history.csv"))
            .unwrap_or_else(|| PathBuf::from("history.csv"))
    }

    /// Get the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append today's snapshot. Skips if today's row already exists.
    pub fn append_snapshot(&self, portfolio: &Portfolio) -> Result<SnapshotOutcome> {
        let today = Local::now().date_naive();

        if self.path.exists() {
            let existing = self.read_snapshots()?;
            if existing.iter().any(|row| row.date == today) {
                return Ok(SnapshotOutcome {
                    written: false,
                    message: format!("Snapshot for {} already exists, skipping.", today),
                });
            }
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let write_header =
            !self.path.exists() || self.path.metadata().map(|m| m.len() == 0).unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if write_header {
            writeln!(file, "{}", COLUMNS)?;
        }
        writeln!(
            file,
            "{},{:.2},{:.2},{:.2},{:.2},{:.6}",
            today,
            portfolio.net_assets,
            portfolio.market_value,
            portfolio.cash,
            portfolio.day_pnl,
            portfolio.day_pnl_pct
        )?;

        Ok(SnapshotOutcome {
            written: true,
            message: format!("Snapshot saved for {} -> {}", today, self.path.display()),
        })
    }

    /// Read all snapshots from the journal. Malformed rows are skipped.
    pub fn read_snapshots(&self) -> Result<Vec<SnapshotRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut rows = Vec::new();

        for line in content.lines().skip(1) {
            if let Some(row) = parse_row(line) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

impl Default for HistoryFile {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_row(line: &str) -> Option<SnapshotRow> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 6 {
        return None;
    }

    Some(SnapshotRow {
        date: NaiveDate::parse_from_str(fields[0], "%Y-%m-%d").ok()?,
        net_assets: fields[1].parse().ok()?,
        market_value: fields[2].parse().ok()?,
        cash: fields[3].parse().ok()?,
        day_pnl: fields[4].parse().ok()?,
        day_pnl_pct: fields[5].parse().ok()?,
    })
}

/// Filter snapshots by period string (1m, 3m, 6m, 1y, all).
///
/// Unknown period strings return the rows unfiltered.
pub fn filter_by_period(rows: &[SnapshotRow], period: &str) -> Vec<SnapshotRow> {
    let days = match period {
        "1m" => 30,
        "3m" => 91,
        "6m" => 182,
        "1y" => 365,
        _ => return rows.to_vec(),
    };

    let cutoff = Local::now().date_naive() - Duration::days(days);
    rows.iter().filter(|r| r.date >= cutoff).cloned().collect()
}

/// Performance stats computed from snapshot rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPerformance {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_nav: f64,
    pub end_nav: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub best_day: (NaiveDate, f64),
    pub worst_day: (NaiveDate, f64),
    pub data_points: usize,
}

/// Compute performance stats from snapshot rows. None when empty.
pub fn compute_performance(rows: &[SnapshotRow]) -> Option<HistoryPerformance> {
    if rows.is_empty() {
        return None;
    }

    let mut sorted: Vec<&SnapshotRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let start = sorted[0];
    let end = sorted[sorted.len() - 1];
    let total_return_pct = if start.net_assets > 0.0 {
        (end.net_assets - start.net_assets) / start.net_assets * 100.0
    } else {
        0.0
    };

    let mut peak = start.net_assets;
    let mut max_dd = 0.0;
    let mut best = start;
    let mut worst = start;

    for row in &sorted {
        if row.net_assets > peak {
            peak = row.net_assets;
        }
        let dd = if peak > 0.0 {
            (row.net_assets - peak) / peak
        } else {
            0.0
        };
        if dd < max_dd {
            max_dd = dd;
        }
        if row.day_pnl_pct > best.day_pnl_pct {
            best = row;
        }
        if row.day_pnl_pct < worst.day_pnl_pct {
            worst = row;
        }
    }

    Some(HistoryPerformance {
        start_date: start.date,
        end_date: end.date,
        start_nav: start.net_assets,
        end_nav: end.net_assets,
        total_return_pct,
        max_drawdown_pct: max_dd * 100.0,
        best_day: (best.date, best.day_pnl_pct),
        worst_day: (worst.date, worst.day_pnl_pct),
        data_points: sorted.len(),
    })
}
