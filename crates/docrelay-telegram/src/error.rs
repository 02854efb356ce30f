use docrelay_channels::ChannelError;

/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] teloxide::RequestError),

    #[error("no bot token configured")]
    NoToken,

    #[error("not a Telegram chat id: {0}")]
    InvalidChat(String),

    #[error("not a Telegram message id: {0}")]
    InvalidMessage(String),
}

impl TelegramError {
    pub fn code(&self) -> &'static str {
        match self {
            TelegramError::Teloxide(_) => "TELEGRAM_API_ERROR",
            TelegramError::NoToken => "NO_TOKEN",
            TelegramError::InvalidChat(_) => "INVALID_CHAT",
            TelegramError::InvalidMessage(_) => "INVALID_MESSAGE",
        }
    }
}

impl From<TelegramError> for ChannelError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Teloxide(e) => crate::channel::map_request_error(e),
            TelegramError::InvalidMessage(id) => ChannelError::NotFound(id),
            other => ChannelError::Rejected(other.to_string()),
        }
    }
}
