pub mod channel;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod retry;

pub use channel::OutputChannel;
pub use error::ChannelError;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{CallKind, ChannelCall, MemoryChannel};
pub use retry::{edit_with_retry, send_with_retry};
