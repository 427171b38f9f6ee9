//! Bot API HTTP client.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::types::{ApiResponse, BotIdentity, Update, WebhookInfo};
use crate::config::TelegramConfig;

/// Errors that can occur during Bot API calls.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Transport failure: connect, timeout, TLS, or body read.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Non-success HTTP status with a body that is not a Bot API envelope.
    #[error("Bot API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The Bot API answered with `ok: false`.
    #[error("Bot API error {code}: {description}")]
    Api { code: i32, description: String },

    #[error("Bot API response for {0} carried no result")]
    MissingResult(&'static str),

    #[error("Failed to decode Bot API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL embeds the bot token.
        Self::Http(err.without_url())
    }
}

/// Thin client over the Bot API methods this crate uses.
#[derive(Clone)]
pub struct BotClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl BotClient {
    /// Creates a client whose every request is bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            token: config.bot_token.clone(),
        })
    }

    /// Fetches the bot's own account.
    pub async fn get_me(&self) -> Result<BotIdentity, TelegramError> {
        self.get("getMe", &[]).await
    }

    /// Fetches the webhook state.
    pub async fn get_webhook_info(&self) -> Result<WebhookInfo, TelegramError> {
        self.get("getWebhookInfo", &[]).await
    }

    /// Fetches up to `limit` pending updates without long polling.
    pub async fn get_updates(&self, limit: u8) -> Result<Vec<Update>, TelegramError> {
        self.get(
            "getUpdates",
            &[("limit", limit.to_string()), ("timeout", "0".to_owned())],
        )
        .await
    }

    /// Sends an HTML-formatted text message.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let _sent: serde_json::Value = self.post("sendMessage", &body).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, TelegramError> {
        debug!("GET {}", method);
        let response = self
            .http
            .get(self.method_url(method))
            .query(query)
            .send()
            .await?;
        Self::decode(method, response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &serde_json::Value,
    ) -> Result<T, TelegramError> {
        debug!("POST {}", method);
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;
        Self::decode(method, response).await
    }

    async fn decode<T: DeserializeOwned>(
        method: &'static str,
        response: Response,
    ) -> Result<T, TelegramError> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) if envelope.ok => envelope.result.ok_or(TelegramError::MissingResult(method)),
            Ok(envelope) => Err(TelegramError::Api {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i32::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "Unknown error".to_owned()),
            }),
            Err(err) if status.is_success() => Err(TelegramError::Decode(err)),
            Err(_) => Err(TelegramError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 200),
            }),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

impl std::fmt::Debug for BotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
