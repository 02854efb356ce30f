use docrelay_channels::ChannelError;
use docrelay_core::DocrelayError;
use thiserror::Error;

/// Failures that terminate a relay.
///
/// Edit failures never appear here: they are logged and counted in the
/// [`RelayReport`](crate::relay::RelayReport) while the relay carries on.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The chunk source reported a conversion or transport failure.
    #[error("conversion failed: {0}")]
    Source(String),

    /// No message could be posted, so there is nothing left to edit.
    #[error("could not post message: {0}")]
    ChannelSend(#[source] ChannelError),

    /// The document could not be fetched or read before the relay started.
    #[error("document unavailable: {0}")]
    Document(#[from] DocrelayError),
}

impl RelayError {
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Source(_) => "SOURCE_ERROR",
            RelayError::ChannelSend(_) => "CHANNEL_SEND_ERROR",
            RelayError::Document(e) => e.code(),
        }
    }

    /// One-line text shown to the user when their relay fails.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Source(_) => "⚠️ The document could not be converted.".to_string(),
            RelayError::ChannelSend(_) => {
                "⚠️ The converted text could not be posted here.".to_string()
            }
            RelayError::Document(DocrelayError::PayloadTooLarge { max, .. }) => {
                format!("⚠️ The document is too large (limit is {} MB).", max / (1024 * 1024))
            }
            RelayError::Document(_) => "⚠️ The document could not be downloaded.".to_string(),
        }
    }
}
