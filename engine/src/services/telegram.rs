// Telegram Bot API as a `MessageSender`.
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::notifier::MessageSender;
use crate::config::TelegramSettings;
use crate::error::EngineError;

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(TelegramClient {
            http,
            endpoint: format!("{}/bot{}/sendMessage", settings.base_url.trim_end_matches('/'), settings.bot_token),
        })
    }
}

/// Telegram answers `{"ok": false, ...}` for rejected messages, sometimes with a 2xx status.
pub fn check_send_response(body: &str) -> Result<(), EngineError> {
    let response: SendMessageResponse = serde_json::from_str(body)?;
    if response.ok {
        Ok(())
    } else {
        Err(EngineError::NotificationError(format!(
            "Telegram error {}: {}",
            response.error_code.unwrap_or_default(),
            response.description.unwrap_or_else(|| "no description".to_string())
        )))
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), EngineError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            // The URL embeds the bot token; keep it out of error messages.
            .map_err(|e| EngineError::from(e.without_url()))?;
        let body = response.text().await.map_err(|e| EngineError::from(e.without_url()))?;
        check_send_response(&body)
    }
}
