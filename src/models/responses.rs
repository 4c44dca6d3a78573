use serde::{Deserialize, Serialize};

use crate::models::domain::{EngineSnapshot, Outbound, UserId};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Engine counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub snapshot: EngineSnapshot,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Profile registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitProfileResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub created: bool,
}

/// Result of dispatching one inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub delivered: usize,
    pub failed: usize,
}

/// Drained in-memory outbox of one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub messages: Vec<Outbound>,
}
