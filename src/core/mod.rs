// Core pairing & relay exports
pub mod commands;
pub mod compat;
pub mod dialog;
pub mod dispatcher;
pub mod engine;
pub mod notices;
pub mod state;

pub use commands::Command;
pub use compat::compatible;
pub use dialog::{DialogReply, ProfileDialog, SetupStep};
pub use dispatcher::{run_expiry_sweeper, DeliveryReport, Dispatcher};
pub use engine::{EngineError, LeaveOutcome, MatchOutcome, PairingEngine};
pub use state::{EngineState, SessionTable, WaitingPool};
