//! Telegram Bot API notification transport.

use crate::{Error, Result};
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends messages through the Telegram Bot API.
///
/// Uses a blocking client: the toolkit runs one synchronous cycle per
/// invocation, so there is no runtime to hand the request to.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::blocking::Client,
}

impl TelegramNotifier {
    /// Create a notifier for a bot token and target chat/channel ID.
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Notify(format!("build http client: {}", e)))?;

        Ok(Self {
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            client,
        })
    }

    /// Send a MarkdownV2-formatted message.
    pub fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "MarkdownV2",
            }))
            .send()
            .map_err(|e| Error::Notify(format!("telegram request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Notify(format!(
                "telegram API error {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_builds() {
        let notifier = TelegramNotifier::new("123456:ABC-DEF", "@channel").unwrap();
        assert_eq!(notifier.chat_id, "@channel");
        assert_eq!(notifier.bot_token, "123456:ABC-DEF");
    }
}
