//! Technical indicators over historical price series.
//!
//! All functions are pure over caller-supplied `&[f64]` series; fetching
//! market data is a collaborator concern. Provided indicators:
//!
//! - **SMA / EMA / WMA**: moving averages
//! - **RSI**: Relative Strength Index with extreme detection
//! - **Bollinger Bands**: mean and standard deviation bands
//! - **MACD**: Moving Average Convergence Divergence

mod rsi;
mod sma;

pub use rsi::{detect_rsi_extremes, rsi, rsi_latest, rsi_signals, RsiExtreme};
pub use sma::{ema, ema_latest, is_death_cross, is_golden_cross, sma, sma_latest, wma};

use serde::{Deserialize, Serialize};

/// Bollinger Bands result (full series).
#[derive(Debug, Clone)]
pub struct BollingerBands {
    /// Middle band (SMA)
    pub middle: Vec<f64>,
    /// Upper band (middle + num_std * std)
    pub upper: Vec<f64>,
    /// Lower band (middle - num_std * std)
    pub lower: Vec<f64>,
}

/// Calculate Bollinger Bands.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period (typically 20)
/// * `num_std` - Number of standard deviations (typically 2.0)
///
/// # Returns
///
/// BollingerBands with middle, upper, and lower bands.
pub fn bollinger_bands(data: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let n = data.len();
    let mut middle = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut lower = vec![0.0; n];

    for i in period..n {
        let window = &data[i - period..i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        middle[i] = mean;
        upper[i] = mean + num_std * std;
        lower[i] = mean - num_std * std;
    }

    BollingerBands {
        middle,
        upper,
        lower,
    }
}

/// Latest Bollinger Band values with band position metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BollingerSnapshot {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// (upper - lower) / middle
    pub bandwidth: f64,
    /// Position of the last price within the bands (0 = lower, 1 = upper)
    pub percent_b: f64,
}

/// Latest Bollinger Band snapshot over the trailing window, or None with
/// insufficient data.
///
/// Uses the sample standard deviation over the last `period` prices.
pub fn bollinger_latest(data: &[f64], period: usize, num_std: f64) -> Option<BollingerSnapshot> {
    let n = data.len();
    if period < 2 || n < period {
        return None;
    }

    let window = &data[n - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance =
        window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / (period as f64 - 1.0);
    let std = variance.sqrt();

    let upper = middle + num_std * std;
    let lower = middle - num_std * std;

    let bandwidth = if middle != 0.0 {
        (upper - lower) / middle
    } else {
        0.0
    };

    let current = data[n - 1];
    let percent_b = if upper != lower {
        (current - lower) / (upper - lower)
    } else {
        0.5
    };

    Some(BollingerSnapshot {
        upper,
        middle,
        lower,
        bandwidth,
        percent_b,
    })
}

/// Calculate momentum (rate of change over n periods).
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// Momentum values as percentage change.
pub fn momentum(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    for i in period..n {
        if data[i - period] != 0.0 {
            result[i] = (data[i] - data[i - period]) / data[i - period];
        }
    }

    result
}

/// MACD (Moving Average Convergence Divergence) result.
#[derive(Debug, Clone)]
pub struct Macd {
    /// MACD line (fast EMA - slow EMA)
    pub macd_line: Vec<f64>,
    /// Signal line (EMA of MACD line)
    pub signal_line: Vec<f64>,
    /// Histogram (MACD - Signal)
    pub histogram: Vec<f64>,
}

/// Calculate MACD indicator.
///
/// # Arguments
///
/// * `data` - Price series
/// * `fast_period` - Fast EMA period (typically 12)
/// * `slow_period` - Slow EMA period (typically 26)
/// * `signal_period` - Signal line EMA period (typically 9)
///
/// # Returns
///
/// MACD with macd_line, signal_line, and histogram.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(data, fast_period);
    let slow_ema = ema(data, slow_period);

    let n = data.len();
    let mut macd_line = vec![0.0; n];

    for i in 0..n {
        macd_line[i] = fast_ema[i] - slow_ema[i];
    }

    let signal_line = ema(&macd_line, signal_period);

    let mut histogram = vec![0.0; n];
    for i in 0..n {
        histogram[i] = macd_line[i] - signal_line[i];
    }

    Macd {
        macd_line,
        signal_line,
        histogram,
    }
}
