//! Step-based alert deduplication state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Absolute tolerance applied at step boundaries so a magnitude landing
/// within rounding error of `threshold + n * step` counts as step `n`.
const STEP_EPSILON: f64 = 1e-9;

/// Per-entity "last fired step" map.
///
/// Keys are composite: `price:<TICKER>` for per-position checks,
/// `pnl:portfolio` for the aggregate P&L check. A key is present exactly
/// while the entity's magnitude sits at or above its threshold; the caller
/// removes it the moment the magnitude drops back below, which is what lets
/// a later crossing re-fire from step 0.
///
/// Serializes as a flat JSON object (`{"price:TQQQ": 1}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DedupState {
    steps: BTreeMap<String, i64>,
}

impl DedupState {
    /// Dedup key for the aggregate portfolio P&L check.
    pub const PNL_KEY: &'static str = "pnl:portfolio";

    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dedup key for a per-position price check.
    pub fn price_key(ticker: &str) -> String {
        format!("price:{}", ticker.to_uppercase())
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no entity is currently tracked.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The last step recorded for a key, if any.
    pub fn last_step(&self, key: &str) -> Option<i64> {
        self.steps.get(key).copied()
    }

    /// Decide whether an over-threshold observation should fire an alert,
    /// updating the recorded step as a side effect.
    ///
    /// `magnitude` is the absolute observed metric (e.g. `abs(day_pnl_pct)`).
    /// Step 0 means "just crossed the threshold"; step n means "crossed
    /// threshold + n * step_size". Fires on the first crossing and whenever a
    /// new step boundary is reached; returns false otherwise.
    ///
    /// A non-positive `step_size` disables deduplication: always fires,
    /// leaves no state behind.
    pub fn should_alert(
        &mut self,
        key: &str,
        magnitude: f64,
        threshold: f64,
        step_size: f64,
    ) -> bool {
        if step_size <= 0.0 {
            return true;
        }

        // How many full steps above the threshold the magnitude sits.
        let steps_above = ((magnitude - threshold + STEP_EPSILON) / step_size).floor() as i64;
        let current_step = steps_above.max(0);

        match self.steps.get(key) {
            None => {
                // First time crossing the threshold
                self.steps.insert(key.to_string(), current_step);
                true
            }
            Some(&last_step) if current_step > last_step => {
                // Crossed a new step boundary
                self.steps.insert(key.to_string(), current_step);
                true
            }
            Some(&last_step) => {
                debug!(key, current_step, last_step, "alert suppressed, same step");
                false
            }
        }
    }

    /// Forget a key so the next crossing fires again from step 0.
    ///
    /// Called by the evaluator whenever the metric is observed below its
    /// threshold. Returns whether the key was present.
    pub fn clear(&mut self, key: &str) -> bool {
        self.steps.remove(key).is_some()
    }
}
