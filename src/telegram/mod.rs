pub mod client;
pub mod types;

pub use client::{ClientConfig, Messenger, TelegramClient};
pub use types::{Chat, Message, Update};
