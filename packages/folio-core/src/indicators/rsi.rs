//! Relative Strength Index (RSI) indicator.

use serde::{Deserialize, Serialize};

/// Calculate RSI value from average gain and average loss.
/// Handles edge cases: no losses (RSI=100), no gains (RSI=0), no change (RSI=50).
#[inline]
fn calculate_rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        if avg_gain <= 0.0 {
            50.0 // No change
        } else {
            100.0 // All gains, no losses
        }
    } else if avg_gain <= 0.0 {
        0.0 // All losses, no gains
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Calculate Relative Strength Index.
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Formula:
/// 1. Calculate price changes
/// 2. Separate gains and losses
/// 3. Calculate average gain and average loss (Wilder's smoothing)
/// 4. RS = average_gain / average_loss
/// 5. RSI = 100 - (100 / (1 + RS))
///
/// # Arguments
///
/// * `prices` - Price series (typically closing prices)
/// * `period` - Lookback period (typically 14)
///
/// # Returns
///
/// Vector of RSI values (0-100 scale). Values below 30 typically indicate
/// oversold conditions, above 70 indicate overbought.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let n = prices.len();
    let mut result = vec![50.0; n]; // Default to neutral RSI

    if n < 2 || period == 0 {
        return result;
    }

    // Calculate price changes
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];

    for i in 1..n {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change; // Store as positive value
        }
    }

    // Need at least period+1 prices to calculate
    if n <= period {
        return result;
    }

    // Initial averages use a plain mean over the first period
    let mut avg_gain: f64 = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses[1..=period].iter().sum::<f64>() / period as f64;

    result[period] = calculate_rsi_value(avg_gain, avg_loss);

    // Wilder's smoothing: avg = alpha * current + (1 - alpha) * prev_avg
    let alpha = 1.0 / period as f64;

    for i in (period + 1)..n {
        avg_gain = alpha * gains[i] + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * losses[i] + (1.0 - alpha) * avg_loss;

        result[i] = calculate_rsi_value(avg_gain, avg_loss);
    }

    result
}

/// Latest RSI value, or None with insufficient data (fewer than period + 1
/// prices).
pub fn rsi_latest(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    rsi(prices, period).last().copied()
}

/// Generate RSI-based trading signals.
///
/// # Arguments
///
/// * `rsi_values` - Calculated RSI values
/// * `oversold` - Oversold threshold (typically 30)
/// * `overbought` - Overbought threshold (typically 70)
///
/// # Returns
///
/// Vector of signals: 1.0 = buy (oversold), -1.0 = sell (overbought), 0.0 = hold
pub fn rsi_signals(rsi_values: &[f64], oversold: f64, overbought: f64) -> Vec<f64> {
    rsi_values
        .iter()
        .map(|&rsi| {
            if rsi < oversold {
                1.0 // Buy signal (oversold)
            } else if rsi > overbought {
                -1.0 // Sell signal (overbought)
            } else {
                0.0 // Hold
            }
        })
        .collect()
}

/// An RSI extreme detected for a ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsiExtreme {
    pub ticker: String,
    pub rsi: f64,
    pub is_overbought: bool,
    pub is_oversold: bool,
}

/// Detect RSI extremes across tickers from supplied price histories.
///
/// Tickers whose series is too short for the period are skipped.
///
/// # Arguments
///
/// * `histories` - (ticker, closing prices) pairs
/// * `period` - RSI period (typically 14)
/// * `overbought` - Overbought threshold (typically 70)
/// * `oversold` - Oversold threshold (typically 30)
pub fn detect_rsi_extremes(
    histories: &[(String, Vec<f64>)],
    period: usize,
    overbought: f64,
    oversold: f64,
) -> Vec<RsiExtreme> {
    let mut results = Vec::new();

    for (ticker, prices) in histories {
        let Some(value) = rsi_latest(prices, period) else {
            continue;
        };

        let is_overbought = value >= overbought;
        let is_oversold = value <= oversold;

        if is_overbought || is_oversold {
            results.push(RsiExtreme {
                ticker: ticker.clone(),
                rsi: value,
                is_overbought,
                is_oversold,
            });
        }
    }

    results
}
