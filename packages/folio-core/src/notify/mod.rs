//! Alert formatting and notification transports.
//!
//! Formatters are always available; the Telegram transport is gated behind
//! the `notify` feature so library consumers that only evaluate alerts do
//! not pull in an HTTP client.

mod format;
#[cfg(feature = "notify")]
mod telegram;

pub use format::{format_alert_telegram, format_alert_text, format_alerts_telegram};
#[cfg(feature = "notify")]
pub use telegram::TelegramNotifier;
