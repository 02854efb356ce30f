pub mod adapter;
pub mod channel;
pub mod error;
pub mod files;
pub mod handler;

pub use adapter::TelegramAdapter;
pub use channel::TelegramChannel;
pub use error::TelegramError;
pub use files::TelegramFileStore;
pub use handler::RelayContext;
