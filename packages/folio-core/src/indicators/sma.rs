//! Moving average indicators.

/// Calculate Simple Moving Average.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// Vector of SMA values. First `period-1` values are 0.0.
///
/// # Example
///
/// ```rust
/// use folio_core::indicators::sma;
///
/// let prices = vec![10.0, 11.0, 12.0, 11.0, 10.0, 11.0, 12.0, 13.0, 12.0, 11.0];
/// let sma_values = sma(&prices, 3);
///
/// // SMA at index 2 = (10 + 11 + 12) / 3 = 11.0
/// assert!((sma_values[2] - 11.0).abs() < 0.001);
/// ```
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || period > n {
        return result;
    }

    // Calculate first SMA using simple sum
    let mut sum: f64 = data[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    // Use rolling window for subsequent values
    for i in period..n {
        sum = sum - data[i - period] + data[i];
        result[i] = sum / period as f64;
    }

    result
}

/// Latest SMA value, or None with insufficient data.
pub fn sma_latest(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Calculate Exponential Moving Average.
///
/// Uses the formula: EMA[i] = alpha * price[i] + (1 - alpha) * EMA[i-1]
/// where alpha = 2 / (period + 1)
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period (used to calculate smoothing factor)
///
/// # Returns
///
/// Vector of EMA values.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || n == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    // Initialize with first value
    result[0] = data[0];

    // Calculate EMA
    for i in 1..n {
        result[i] = alpha * data[i] + (1.0 - alpha) * result[i - 1];
    }

    result
}

/// Latest EMA value, or None with insufficient data.
pub fn ema_latest(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    ema(data, period).last().copied()
}

/// Calculate Weighted Moving Average (WMA).
///
/// More recent prices have higher weights.
/// Weight for position i from end = (period - i + 1)
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// Vector of WMA values.
pub fn wma(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || period > n {
        return result;
    }

    // Weight sum = 1 + 2 + ... + period = period * (period + 1) / 2
    let weight_sum = (period * (period + 1)) as f64 / 2.0;

    for i in (period - 1)..n {
        let mut weighted_sum = 0.0;
        for j in 0..period {
            let weight = (j + 1) as f64;
            let idx = i + j + 1 - period; // Avoid overflow: rewritten from (i - period + 1 + j)
            weighted_sum += data[idx] * weight;
        }
        result[i] = weighted_sum / weight_sum;
    }

    result
}

/// Check for a golden cross (fast MA crosses above slow MA between the
/// previous bar and the latest one).
pub fn is_golden_cross(data: &[f64], fast: usize, slow: usize) -> bool {
    let n = data.len();
    if fast == 0 || slow == 0 || n < slow + 2 {
        return false;
    }

    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let fast_prev = mean(&data[n - fast - 1..n - 1]);
    let fast_curr = mean(&data[n - fast..]);
    let slow_prev = mean(&data[n - slow - 1..n - 1]);
    let slow_curr = mean(&data[n - slow..]);

    fast_prev <= slow_prev && fast_curr > slow_curr
}

/// Check for a death cross (fast MA crosses below slow MA between the
/// previous bar and the latest one).
pub fn is_death_cross(data: &[f64], fast: usize, slow: usize) -> bool {
    let n = data.len();
    if fast == 0 || slow == 0 || n < slow + 2 {
        return false;
    }

    let mean = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let fast_prev = mean(&data[n - fast - 1..n - 1]);
    let fast_curr = mean(&data[n - fast..]);
    let slow_prev = mean(&data[n - slow - 1..n - 1]);
    let slow_curr = mean(&data[n - slow..]);

    fast_prev >= slow_prev && fast_curr < slow_curr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        // SMA[2] = (1 + 2 + 3) / 3 = 2.0
        assert!((result[2] - 2.0).abs() < 0.001);

        // SMA[4] = (3 + 4 + 5) / 3 = 4.0
        assert!((result[4] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_period_larger_than_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = sma(&data, 10);
        assert!(result.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_sma_latest() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((sma_latest(&data, 3).unwrap() - 4.0).abs() < 0.001);
        assert!(sma_latest(&data, 10).is_none());
    }

    #[test]
    fn test_ema_basic() {
        let data = vec![10.0, 11.0, 12.0, 11.0, 10.0];
        let result = ema(&data, 3);

        // EMA should start from first value
        assert!((result[0] - 10.0).abs() < 0.001);

        // EMA should be between min and max
        for i in 0..data.len() {
            assert!(result[i] >= 9.0 && result[i] <= 13.0);
        }
    }

    #[test]
    fn test_ema_responsiveness() {
        // When price jumps, EMA should move faster than SMA initially
        let data: Vec<f64> = (0..20)
            .map(|i| if i < 10 { 100.0 } else { 150.0 })
            .collect();

        let sma_result = sma(&data, 5);
        let ema_result = ema(&data, 5);

        assert!(ema_result[11] > sma_result[11]);
    }

    #[test]
    fn test_wma() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = wma(&data, 3);

        // WMA[2] = (1*1 + 2*2 + 3*3) / 6 = 14/6
        assert!((result[2] - 14.0 / 6.0).abs() < 0.001);
    }

    #[test]
    fn test_golden_cross() {
        // A dip below trend followed by a sharp rally: the fast MA sat under
        // the slow MA on the previous bar and overtakes it on the last one
        let mut data = vec![100.0; 30];
        data.extend([80.0, 80.0, 80.0, 200.0]);
        assert!(is_golden_cross(&data, 3, 20));
        assert!(!is_death_cross(&data, 3, 20));
    }

    #[test]
    fn test_death_cross() {
        let mut data = vec![100.0; 30];
        data.extend([120.0, 120.0, 120.0, 20.0]);
        assert!(is_death_cross(&data, 3, 20));
        assert!(!is_golden_cross(&data, 3, 20));
    }

    #[test]
    fn test_cross_insufficient_data() {
        let data = vec![100.0, 101.0, 102.0];
        assert!(!is_golden_cross(&data, 50, 200));
        assert!(!is_death_cross(&data, 50, 200));
    }

    #[test]
    fn test_empty_data() {
        let data: Vec<f64> = vec![];
        assert!(sma(&data, 3).is_empty());
        assert!(ema(&data, 3).is_empty());
        assert!(wma(&data, 3).is_empty());
        assert!(sma_latest(&data, 3).is_none());
        assert!(ema_latest(&data, 3).is_none());
    }
}
