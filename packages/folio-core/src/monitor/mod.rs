//! Price movement monitoring with step-based alert deduplication.
//!
//! One monitoring cycle is: load the dedup state from disk, evaluate the
//! portfolio against the configured thresholds, save the updated state.
//! Alerts fire when a threshold is first crossed, then only again when the
//! value crosses the next step boundary.

mod dedup;
mod price;
mod state_file;

pub use dedup::DedupState;
pub use price::PriceMonitor;
pub use state_file::StateFile;
