use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::UserId;
use crate::services::transport::{DeliveryError, Transport};

#[derive(Debug, Default)]
struct Mailboxes {
    outbox: HashMap<UserId, Vec<String>>,
    rejected: HashSet<UserId>,
}

/// Transport that keeps messages in memory
///
/// Used when no Telegram bot is configured (messages are read back over HTTP)
/// and by tests.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    inner: Mutex<Mailboxes>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything queued for `user_id`
    pub async fn take(&self, user_id: UserId) -> Vec<String> {
        self.inner
            .lock()
            .await
            .outbox
            .remove(&user_id)
            .unwrap_or_default()
    }

    /// Number of users with undrained messages
    pub async fn pending_users(&self) -> usize {
        self.inner.lock().await.outbox.len()
    }

    /// Make future deliveries to `user_id` fail
    pub async fn reject(&self, user_id: UserId) {
        self.inner.lock().await.rejected.insert(user_id);
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        let mut inner = self.inner.lock().await;
        if inner.rejected.contains(&user_id) {
            return Err(DeliveryError::Rejected(user_id));
        }

        inner.outbox.entry(user_id).or_default().push(text.to_string());
        tracing::trace!(user_id, "Queued message in memory");
        Ok(())
    }
}
