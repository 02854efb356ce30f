use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::warn;

use docrelay_core::types::{Destination, MessageRef};

use crate::{channel::OutputChannel, error::ChannelError};

/// Upper bound on a single wait between attempts (seconds).
const RETRY_MAX_SECS: u64 = 60;

/// Send `text`, retrying only while the channel reports rate limiting.
///
/// Waits for the platform-supplied `retry_after` (capped at [`RETRY_MAX_SECS`])
/// between attempts, up to `max_attempts` tries in total. Any other error is
/// returned immediately, since a send that failed for another reason may
/// already have been delivered.
pub async fn send_with_retry(
    channel: &dyn OutputChannel,
    dest: &Destination,
    text: &str,
    max_attempts: u32,
) -> Result<MessageRef, ChannelError> {
    retry_rate_limited(channel, dest, "send", max_attempts, || {
        channel.send(dest, text)
    })
    .await
}

/// Edit `message` to show `text`, with the same rate-limit handling as
/// [`send_with_retry`].
pub async fn edit_with_retry(
    channel: &dyn OutputChannel,
    dest: &Destination,
    message: &MessageRef,
    text: &str,
    max_attempts: u32,
) -> Result<(), ChannelError> {
    retry_rate_limited(channel, dest, "edit", max_attempts, || {
        channel.edit(dest, message, text)
    })
    .await
}

async fn retry_rate_limited<T, F, Fut>(
    channel: &dyn OutputChannel,
    dest: &Destination,
    op: &str,
    max_attempts: u32,
    mut call: F,
) -> Result<T, ChannelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChannelError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                let Some(delay) = e.retry_after() else {
                    return Err(e);
                };
                let delay = delay.min(Duration::from_secs(RETRY_MAX_SECS));
                warn!(
                    channel = %channel.name(),
                    destination = %dest,
                    op,
                    attempt,
                    max = max_attempts,
                    retry_after_secs = delay.as_secs(),
                    "rate limited, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryChannel;

    #[tokio::test(start_paused = true)]
    async fn rate_limited_send_is_retried_after_delay() {
        let channel = MemoryChannel::new(100);
        channel.fail_next_send(ChannelError::RateLimited { retry_after_secs: 3 });
        let dest = Destination::from("chat");

        let started = tokio::time::Instant::now();
        let message = send_with_retry(&channel, &dest, "hello", 3).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(channel.text_of(&message).as_deref(), Some("hello"));
        assert_eq!(channel.sent_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let channel = MemoryChannel::new(100);
        channel.fail_next_send(ChannelError::RateLimited { retry_after_secs: 1 });
        channel.fail_next_send(ChannelError::RateLimited { retry_after_secs: 1 });
        let dest = Destination::from("chat");

        let err = send_with_retry(&channel, &dest, "hello", 2).await.unwrap_err();
        assert_eq!(err.code(), "RATE_LIMITED");
        assert_eq!(channel.sent_count(), 0);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let channel = MemoryChannel::new(100);
        channel.fail_next_send(ChannelError::Transport("connection reset".into()));
        let dest = Destination::from("chat");

        let err = send_with_retry(&channel, &dest, "hello", 5).await.unwrap_err();
        assert_eq!(err.code(), "TRANSPORT_ERROR");
        // The scripted failure was consumed by the only attempt.
        assert!(send_with_retry(&channel, &dest, "again", 1).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_edit_waits_before_retrying() {
        let channel = MemoryChannel::new(100);
        let dest = Destination::from("chat");
        let message = channel.send(&dest, "draft").await.unwrap();
        channel.fail_next_edit(ChannelError::RateLimited { retry_after_secs: 2 });

        let started = tokio::time::Instant::now();
        edit_with_retry(&channel, &dest, &message, "final", 3).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(channel.text_of(&message).as_deref(), Some("final"));
    }

    #[tokio::test]
    async fn missing_message_edit_is_not_retried() {
        let channel = MemoryChannel::new(100);
        let dest = Destination::from("chat");
        let message = channel.send(&dest, "draft").await.unwrap();
        channel.delete(&message);

        let err = edit_with_retry(&channel, &dest, &message, "final", 3)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        let edits = channel
            .calls()
            .iter()
            .filter(|c| c.kind == crate::memory::CallKind::Edit)
            .count();
        assert_eq!(edits, 1);
    }
}
