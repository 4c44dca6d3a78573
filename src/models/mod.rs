// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Profile, UserId, Outbound, EngineSnapshot, ANYONE};
pub use requests::{SubmitProfileRequest, InboundMessageRequest, TelegramUpdate, TelegramMessage, TelegramUser, TelegramChat};
pub use responses::{HealthResponse, ErrorResponse, StatsResponse, SubmitProfileResponse, DispatchResponse, OutboxResponse};
