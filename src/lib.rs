//! Flirt Relay - anonymous one-on-one chat pairing and relay service
//!
//! Users build a small profile, ask for a partner, get paired first-fit with
//! the earliest compatible waiting user, and then chat through the service
//! until either side stops.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compatible, Dispatcher, EngineError, LeaveOutcome, MatchOutcome, PairingEngine, ProfileDialog};
pub use models::{Profile, UserId, Outbound, EngineSnapshot};
pub use services::{Transport, DeliveryError, InMemoryTransport, TelegramClient};
