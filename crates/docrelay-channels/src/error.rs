use std::time::Duration;

use thiserror::Error;

/// Errors returned by an output channel's send/edit calls.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The referenced message does not exist (deleted externally, wrong chat, …).
    #[error("Message not found: {0}")]
    NotFound(String),

    /// The platform asked us to slow down.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Network or server failure; the call may or may not have been applied.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform refused the request outright (bad text, missing rights, …).
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ChannelError {
    /// Delay requested by the platform, if this error is a rate limit.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ChannelError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::NotFound(_) => "NOT_FOUND",
            ChannelError::RateLimited { .. } => "RATE_LIMITED",
            ChannelError::Transport(_) => "TRANSPORT_ERROR",
            ChannelError::Rejected(_) => "REJECTED",
        }
    }
}
