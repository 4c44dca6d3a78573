// Service exports
pub mod memory;
pub mod telegram;
pub mod transport;

pub use memory::InMemoryTransport;
pub use telegram::{run_polling, TelegramClient, TelegramError};
pub use transport::{DeliveryError, Transport};
