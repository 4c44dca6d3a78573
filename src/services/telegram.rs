use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;

use crate::core::Dispatcher;
use crate::models::{TelegramUpdate, UserId};
use crate::services::transport::{DeliveryError, Transport};

/// Errors that can occur when talking to the Telegram Bot API
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error {code}: {description}")]
    ApiError { code: u16, description: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Envelope every Bot API method responds with
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

/// Telegram Bot API client
///
/// Sends chat messages and long-polls for updates.
pub struct TelegramClient {
    base_url: String,
    token: String,
    client: Client,
    request_timeout: Duration,
}

impl TelegramClient {
    /// Create a new Telegram client
    pub fn new(base_url: String, token: String, request_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            base_url,
            token,
            client,
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
        timeout: Duration,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            TelegramError::InvalidResponse(format!("{} returned {}: {}", method, status, e))
        })?;

        if !envelope.ok {
            return Err(TelegramError::ApiError {
                code: envelope.error_code.unwrap_or(status.as_u16()),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::InvalidResponse(format!("{} returned no result", method)))
    }

    /// Send a plain text message to a chat
    pub async fn send_message(&self, chat_id: UserId, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text }),
                self.request_timeout,
            )
            .await?;

        tracing::trace!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<TelegramUpdate>, TelegramError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
            self.request_timeout + Duration::from_secs(timeout_secs),
        )
        .await
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        Ok(self.send_message(user_id, text).await?)
    }
}

/// Pull updates with `getUpdates` and dispatch them one at a time
///
/// Updates are handled sequentially so each sender's messages keep their order.
/// Runs until the task is dropped.
pub async fn run_polling(client: &TelegramClient, dispatcher: &Dispatcher, timeout_secs: u64) {
    let mut offset = 0;
    let mut backoff = Duration::from_secs(1);

    tracing::info!("Telegram long polling started");

    loop {
        match client.get_updates(offset, timeout_secs).await {
            Ok(updates) => {
                backoff = Duration::from_secs(1);
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    match update.text_message() {
                        Some((user_id, text)) => {
                            dispatcher.handle(user_id, text).await;
                        }
                        None => tracing::debug!(update_id = update.update_id, "Ignoring non-text update"),
                    }
                }
            }
            Err(e) => {
                tracing::warn!("getUpdates failed, retrying in {:?}: {}", backoff, e);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_secs(60));
            }
        }
    }
}
