use async_trait::async_trait;
use thiserror::Error;

use crate::models::UserId;
use crate::services::telegram::TelegramError;

/// Errors that can occur while delivering a message
///
/// Opaque to the pairing engine: failures are logged, never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error("recipient {0} rejected the message")]
    Rejected(UserId),
}

/// Outbound side of the message transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to `user_id`
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;
}
