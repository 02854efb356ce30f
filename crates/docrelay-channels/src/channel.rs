use async_trait::async_trait;

use docrelay_core::types::{Destination, MessageRef};

use crate::error::ChannelError;

/// Message transport consumed by the relay (Telegram, an in-memory double, …).
///
/// Implementations must be `Send + Sync` so one adapter can serve many
/// concurrent relays from separate Tokio tasks.
#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Maximum number of characters the channel accepts in one message.
    ///
    /// Constant for the lifetime of the channel.
    fn limit(&self) -> usize;

    /// Post a new message to `dest` and return a handle for later edits.
    async fn send(&self, dest: &Destination, text: &str) -> Result<MessageRef, ChannelError>;

    /// Replace the full content of a previously sent message.
    ///
    /// Fails with [`ChannelError::NotFound`] when the message no longer exists.
    async fn edit(
        &self,
        dest: &Destination,
        message: &MessageRef,
        text: &str,
    ) -> Result<(), ChannelError>;
}
