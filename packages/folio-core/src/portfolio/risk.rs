//! Portfolio risk and concentration metrics.
//!
//! VaR, CVaR, Sharpe, Sortino, max drawdown and volatility over a daily
//! returns series, plus weight-concentration metrics over a portfolio
//! snapshot.

use crate::types::{ConcentrationMetrics, Portfolio, RiskMetrics};
use crate::{Error, Result};

const TRADING_DAYS_YEAR: f64 = 252.0;

/// Calculate comprehensive risk metrics for a portfolio.
///
/// # Arguments
///
/// * `returns` - Daily returns (0.01 for a 1% day)
/// * `total_value` - Total portfolio value in currency units
/// * `confidence` - Confidence level for VaR (typically 0.95)
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.04 for 4%)
///
/// # Returns
///
/// `RiskMetrics`, or `InsufficientData` with fewer than 10 data points.
pub fn calculate_risk_metrics(
    returns: &[f64],
    total_value: f64,
    confidence: f64,
    risk_free_rate: f64,
) -> Result<RiskMetrics> {
    if returns.len() < 10 {
        return Err(Error::InsufficientData(
            "Need at least 10 data points for risk calculation".to_string(),
        ));
    }

    if total_value <= 0.0 {
        return Err(Error::InvalidOperation(
            "Portfolio value must be positive".to_string(),
        ));
    }

    let n = returns.len() as f64;
    let mean_return = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / n;
    let std_return = variance.sqrt();

    // Parametric VaR assuming normal returns
    let z_score = norm_ppf(1.0 - confidence);
    let var = -z_score * std_return * total_value;

    // CVaR: mean of the tail beyond the VaR quantile
    let mut sorted_returns: Vec<f64> = returns.to_vec();
    sorted_returns.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let var_idx = ((1.0 - confidence) * n) as usize;
    let cvar = if var_idx > 0 {
        let tail_mean = sorted_returns[..var_idx].iter().sum::<f64>() / var_idx as f64;
        -tail_mean * total_value
    } else {
        var
    };

    let daily_rf = risk_free_rate / TRADING_DAYS_YEAR;
    let excess_return = mean_return - daily_rf;

    let sharpe = if std_return > 0.0 {
        excess_return / std_return * TRADING_DAYS_YEAR.sqrt()
    } else {
        0.0
    };

    // Sortino uses downside deviation only
    let downside: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
    let downside_std = if !downside.is_empty() {
        (downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64).sqrt()
    } else {
        std_return
    };
    let sortino = if downside_std > 0.0 {
        excess_return / downside_std * TRADING_DAYS_YEAR.sqrt()
    } else {
        0.0
    };

    Ok(RiskMetrics {
        confidence_level: confidence,
        var,
        var_percent: (var / total_value) * 100.0,
        cvar,
        cvar_percent: (cvar / total_value) * 100.0,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        max_drawdown_percent: calculate_max_drawdown(returns) * 100.0,
        volatility_percent: volatility(returns),
        daily_mean_return_percent: mean_return * 100.0,
        total_portfolio_value: total_value,
    })
}

/// Calculate maximum drawdown from a series of returns.
///
/// Returns the maximum peak-to-trough decline as a decimal (0.15 for 15%).
pub fn calculate_max_drawdown(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mut cum = 1.0;
    let mut running_max = 1.0;
    let mut max_drawdown = 0.0;

    for r in returns {
        cum *= 1.0 + r;
        if cum > running_max {
            running_max = cum;
        }
        let drawdown = (running_max - cum) / running_max;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }

    max_drawdown
}

/// Calculate annualized volatility from returns, as a percentage.
pub fn volatility(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    variance.sqrt() * TRADING_DAYS_YEAR.sqrt() * 100.0
}

/// Daily returns from a NAV series.
///
/// Zero or negative NAVs contribute a zero return rather than a blowup.
pub fn daily_returns(navs: &[f64]) -> Vec<f64> {
    navs.windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Weight-concentration metrics over a portfolio snapshot.
///
/// HHI is the sum of squared weights: 1.0 for a single-position portfolio,
/// 1/n for n equal positions. Returns None for an empty portfolio.
pub fn portfolio_concentration(portfolio: &Portfolio) -> Option<ConcentrationMetrics> {
    if portfolio.positions.is_empty() {
        return None;
    }

    let sorted = portfolio.sorted_by_weight();
    let hhi: f64 = sorted.iter().map(|p| p.weight * p.weight).sum();
    let top_5_weight: f64 = sorted.iter().take(5).map(|p| p.weight).sum();
    let max = sorted[0];

    Some(ConcentrationMetrics {
        hhi,
        top_5_weight,
        max_position_ticker: max.ticker.clone(),
        max_position_weight: max.weight,
    })
}

/// Inverse cumulative distribution function for standard normal distribution.
///
/// Uses Acklam's algorithm for high accuracy across the full range.
pub fn norm_ppf(p: f64) -> f64 {
    // Coefficients in rational approximations
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];

    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];

    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];

    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let q: f64;
    let r: f64;

    if p < P_LOW {
        q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        q = p - 0.5;
        r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    #[test]
    fn test_norm_ppf() {
        assert!((norm_ppf(0.5)).abs() < 0.001);
        assert!((norm_ppf(0.95) - 1.645).abs() < 0.01);
        assert!((norm_ppf(0.975) - 1.96).abs() < 0.01);
        assert!((norm_ppf(0.05) + 1.645).abs() < 0.01);
    }

    #[test]
    fn test_calculate_risk_metrics() {
        let returns: Vec<f64> = vec![
            0.01, -0.005, 0.008, -0.003, 0.012, -0.007, 0.005, 0.002, -0.004, 0.006, 0.003,
            -0.002, 0.007, -0.001, 0.004,
        ];

        let result = calculate_risk_metrics(&returns, 100000.0, 0.95, 0.04).unwrap();

        assert!(result.var > 0.0);
        assert!(result.cvar >= result.var);
        assert!(result.volatility_percent > 0.0);
        assert_eq!(result.total_portfolio_value, 100000.0);
        assert_eq!(result.confidence_level, 0.95);
    }

    #[test]
    fn test_calculate_risk_metrics_insufficient_data() {
        let returns = vec![0.01, 0.02, 0.01];
        let result = calculate_risk_metrics(&returns, 100000.0, 0.95, 0.04);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_max_drawdown() {
        let returns = vec![0.10, 0.05, -0.15, -0.10, 0.05];
        let mdd = calculate_max_drawdown(&returns);

        // Peak 1.155, trough 0.883: drawdown about 23.5%
        assert!(mdd > 0.20);
        assert!(mdd < 0.30);
    }

    #[test]
    fn test_max_drawdown_no_loss() {
        let returns = vec![0.01, 0.02, 0.03, 0.01, 0.02];
        assert_eq!(calculate_max_drawdown(&returns), 0.0);
    }

    #[test]
    fn test_daily_returns() {
        let navs = vec![100.0, 102.0, 96.9];
        let returns = daily_returns(&navs);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.02).abs() < 1e-9);
        assert!((returns[1] + 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_portfolio_concentration() {
        let mut portfolio = Portfolio::new();
        portfolio
            .positions
            .push(Position::new("NVDA", 1.0, 5000.0).with_weight(0.5));
        portfolio
            .positions
            .push(Position::new("AAPL", 1.0, 3000.0).with_weight(0.3));
        portfolio
            .positions
            .push(Position::new("MSFT", 1.0, 2000.0).with_weight(0.2));

        let cm = portfolio_concentration(&portfolio).unwrap();
        assert!((cm.hhi - 0.38).abs() < 1e-9);
        assert!((cm.top_5_weight - 1.0).abs() < 1e-9);
        assert_eq!(cm.max_position_ticker, "NVDA");
        assert_eq!(cm.max_position_weight, 0.5);
    }

    #[test]
    fn test_portfolio_concentration_empty() {
        assert!(portfolio_concentration(&Portfolio::new()).is_none());
    }

    #[test]
    fn test_volatility() {
        let returns: Vec<f64> = vec![
            0.01, -0.01, 0.02, -0.02, 0.01, -0.01, 0.015, -0.015, 0.005, -0.005,
        ];

        let vol = volatility(&returns);
        assert!(vol > 10.0);
        assert!(vol < 50.0);
    }
}
