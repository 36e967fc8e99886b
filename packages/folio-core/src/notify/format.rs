//! Format alerts for notification channels.

use crate::types::{Alert, AlertSeverity};

/// Icon prefix for a severity level.
fn severity_icon(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => "\u{2139}\u{fe0f}",     // info icon
        AlertSeverity::Warning => "\u{26a0}\u{fe0f}",  // warning icon
        AlertSeverity::Critical => "\u{1f6a8}",        // police light
    }
}

/// Format an alert as plain text.
pub fn format_alert_text(alert: &Alert) -> String {
    if alert.message.is_empty() {
        format!("[{}] {}", alert.severity, alert.title)
    } else {
        format!("[{}] {}\n{}", alert.severity, alert.title, alert.message)
    }
}

/// Format an alert into a Telegram MarkdownV2 string.
pub fn format_alert_telegram(alert: &Alert) -> String {
    let mut lines = vec![format!(
        "{} *{}*",
        severity_icon(alert.severity),
        escape_markdown(&alert.title)
    )];

    if !alert.message.is_empty() {
        lines.push(escape_markdown(&alert.message));
    }

    lines.join("\n")
}

/// Format multiple alerts into a single Telegram message.
pub fn format_alerts_telegram(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "\u{2705} No alerts".to_string();
    }

    alerts
        .iter()
        .map(format_alert_telegram)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Escape special characters for Telegram MarkdownV2.
///
/// Only escapes the characters Telegram requires escaping in non-entity
/// positions.
fn escape_markdown(text: &str) -> String {
    const SPECIAL: &str = "_[]()~`>#+-=|{}.!";
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
