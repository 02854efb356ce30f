use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocrelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },
}

impl DocrelayError {
    /// Short error code string for logs and user-facing notifications.
    pub fn code(&self) -> &'static str {
        match self {
            DocrelayError::Config(_) => "CONFIG_ERROR",
            DocrelayError::Channel { .. } => "CHANNEL_ERROR",
            DocrelayError::Io(_) => "IO_ERROR",
            DocrelayError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }
}

pub type Result<T> = std::result::Result<T, DocrelayError>;
