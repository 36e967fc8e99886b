//! Market bubble / drawdown-risk scoring.
//!
//! Two complementary scores, both computed over caller-supplied series
//! (fetching market data is a collaborator concern):
//!
//! - a **composite bubble index** that blends pre-normalized sentiment and
//!   liquidity indicator scores 60/40 and classifies the regime;
//! - a **drawdown risk score** derived from one benchmark price series
//!   (trend deviation, trend acceleration, realized volatility).

use serde::{Deserialize, Serialize};

const TRADING_DAYS_YEAR: f64 = 252.0;

const SENTIMENT_WEIGHT: f64 = 0.6;
const LIQUIDITY_WEIGHT: f64 = 0.4;

const DANGER_THRESHOLD: f64 = 85.0;

/// A single normalized indicator feeding the composite index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorScore {
    pub name: String,
    /// Raw indicator value before normalization
    pub raw_value: f64,
    /// Normalized 0-100 score (typically a percentile rank)
    pub score: f64,
    /// Weight within its group
    pub weight: f64,
}

impl IndicatorScore {
    pub fn new(name: &str, raw_value: f64, score: f64, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            raw_value,
            score,
            weight,
        }
    }
}

/// Composite bubble index result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleIndex {
    pub composite_score: f64,
    pub sentiment_score: f64,
    pub liquidity_score: f64,
    /// "NORMAL" | "ELEVATED" | "DANGER"
    pub regime: String,
}

/// Compute percentile rank of a value within its history, scaled 0-100.
///
/// An empty history yields the neutral 50.
pub fn percentile_rank(value: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 50.0;
    }
    let below = history.iter().filter(|&&x| x < value).count();
    below as f64 / history.len() as f64 * 100.0
}

/// Classify bubble regime based on composite score.
pub fn classify_regime(score: f64) -> &'static str {
    if score >= DANGER_THRESHOLD {
        "DANGER"
    } else if score >= 60.0 {
        "ELEVATED"
    } else {
        "NORMAL"
    }
}

fn weighted_average(scores: &[IndicatorScore]) -> f64 {
    let total_weight: f64 = scores.iter().map(|s| s.weight).sum();
    if total_weight == 0.0 {
        return 50.0; // neutral fallback
    }
    scores.iter().map(|s| s.weight * s.score).sum::<f64>() / total_weight
}

/// Calculate the composite Market Bubble Index from pre-normalized
/// sentiment and liquidity indicators.
///
/// Either group may be empty (e.g. a data provider was unavailable); it then
/// contributes a neutral 50.
pub fn calculate_bubble_index(
    sentiment: &[IndicatorScore],
    liquidity: &[IndicatorScore],
) -> BubbleIndex {
    let sentiment_score = weighted_average(sentiment);
    let liquidity_score = weighted_average(liquidity);

    let composite = (SENTIMENT_WEIGHT * sentiment_score + LIQUIDITY_WEIGHT * liquidity_score)
        .clamp(0.0, 100.0);

    BubbleIndex {
        composite_score: composite,
        sentiment_score,
        liquidity_score,
        regime: classify_regime(composite).to_string(),
    }
}

/// Drawdown-focused bubble risk for one benchmark series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleRisk {
    /// 0-100 composite drawdown risk
    pub composite_score: f64,
    /// "low_risk" | "moderate" | "elevated" | "high_risk"
    pub regime: String,
    /// SMA-200 deviation component (0-40)
    pub sma200_deviation: f64,
    /// Trend acceleration component (0-30)
    pub trend_acceleration: f64,
    /// Volatility component (0-30)
    pub volatility_regime: f64,
}

/// Calculate a drawdown risk score from a benchmark closing-price series.
///
/// Components:
/// - SMA-200 deviation (0-40 pts)
/// - Trend acceleration (0-30 pts)
/// - Realized volatility (0-30 pts)
///
/// Fewer than 200 prices yields the neutral score of 50 / "moderate".
pub fn bubble_risk_score(prices: &[f64]) -> BubbleRisk {
    if prices.len() < 200 {
        return BubbleRisk {
            composite_score: 50.0,
            regime: "moderate".to_string(),
            sma200_deviation: 0.0,
            trend_acceleration: 0.0,
            volatility_regime: 0.0,
        };
    }

    let dev = sma200_deviation(prices);
    let dev_score = (dev / 30.0 * 40.0).clamp(0.0, 40.0);

    let accel = trend_acceleration(prices, 60);
    let accel_score = (accel / 5.0 * 30.0).clamp(0.0, 30.0);

    let vol = realized_volatility(prices, 20);
    let vol_score = ((vol - 0.20) / 0.50 * 30.0).clamp(0.0, 30.0);

    let composite = (dev_score + accel_score + vol_score).clamp(0.0, 100.0);

    let regime = if composite >= 66.0 {
        "high_risk"
    } else if composite >= 55.0 {
        "elevated"
    } else if composite >= 40.0 {
        "moderate"
    } else {
        "low_risk"
    };

    BubbleRisk {
        composite_score: composite,
        regime: regime.to_string(),
        sma200_deviation: dev_score,
        trend_acceleration: accel_score,
        volatility_regime: vol_score,
    }
}

/// Deviation of the last price from its 200-day SMA, in percent.
fn sma200_deviation(prices: &[f64]) -> f64 {
    let n = prices.len();
    let sma200 = prices[n - 200..].iter().sum::<f64>() / 200.0;
    let current = prices[n - 1];
    if sma200 == 0.0 {
        return 0.0;
    }
    (current - sma200) / sma200 * 100.0
}

/// How sharply log-prices are accelerating above trend: the quadratic
/// coefficient of a degree-2 fit over the trailing window, scaled by 1e4.
fn trend_acceleration(prices: &[f64], window: usize) -> f64 {
    if prices.len() < window + 20 {
        return 0.0;
    }

    let y: Vec<f64> = prices[prices.len() - window..]
        .iter()
        .map(|p| p.ln())
        .collect();

    quadratic_coefficient(&y) * 10_000.0
}

/// Annualized realized volatility of log returns over the trailing window.
fn realized_volatility(prices: &[f64], window: usize) -> f64 {
    if prices.len() < window + 1 {
        return 0.5;
    }

    let log_ret: Vec<f64> = prices
        .windows(2)
        .map(|w| (w[1] / w[0]).ln())
        .collect();
    let tail = &log_ret[log_ret.len() - window..];

    let mean = tail.iter().sum::<f64>() / window as f64;
    let variance = tail.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / window as f64;

    variance.sqrt() * TRADING_DAYS_YEAR.sqrt()
}

/// Leading coefficient of the least-squares quadratic y = a*x^2 + b*x + c
/// over x = 0..n, solved via the normal equations.
fn quadratic_coefficient(y: &[f64]) -> f64 {
    let n = y.len();
    if n < 3 {
        return 0.0;
    }

    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (i, &yi) in y.iter().enumerate() {
        let x = i as f64;
        let x2 = x * x;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        t0 += yi;
        t1 += x * yi;
        t2 += x2 * yi;
    }
    let s0 = n as f64;

    // Cramer's rule on the 3x3 normal-equation matrix
    let det = s4 * (s2 * s0 - s1 * s1) - s3 * (s3 * s0 - s1 * s2) + s2 * (s3 * s1 - s2 * s2);
    if det.abs() < 1e-12 {
        return 0.0;
    }

    let det_a = t2 * (s2 * s0 - s1 * s1) - s3 * (t1 * s0 - s1 * t0) + s2 * (t1 * s1 - s2 * t0);
    det_a / det
}
