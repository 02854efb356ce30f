//! Telegram as an [`OutputChannel`]: `sendMessage` and `editMessageText`.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};
use tracing::debug;

use docrelay_channels::{ChannelError, OutputChannel};
use docrelay_core::types::{Destination, MessageRef};

use crate::error::TelegramError;

/// Maximum characters per Telegram message (the API allows 4096).
pub const TELEGRAM_LIMIT: usize = 4090;

/// Posts and edits plain-text messages through a teloxide `Bot`.
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl OutputChannel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn limit(&self) -> usize {
        TELEGRAM_LIMIT
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<MessageRef, ChannelError> {
        let chat_id = chat_id(dest)?;
        let sent = self
            .bot
            .send_message(chat_id, text)
            .await
            .map_err(map_request_error)?;
        debug!(chat_id = chat_id.0, message_ref = sent.id.0, "telegram: message sent");
        Ok(MessageRef::from(sent.id.0.to_string()))
    }

    async fn edit(
        &self,
        dest: &Destination,
        message: &MessageRef,
        text: &str,
    ) -> Result<(), ChannelError> {
        let chat_id = chat_id(dest)?;
        let message_id = message_id(message)?;
        match self.bot.edit_message_text(chat_id, message_id, text).await {
            Ok(_) => Ok(()),
            // Same text as already shown; nothing to do.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(map_request_error(e)),
        }
    }
}

/// Parse a destination into a Telegram chat id.
pub fn chat_id(dest: &Destination) -> Result<ChatId, TelegramError> {
    dest.as_str()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| TelegramError::InvalidChat(dest.to_string()))
}

fn message_id(message: &MessageRef) -> Result<MessageId, TelegramError> {
    message
        .as_str()
        .parse::<i32>()
        .map(MessageId)
        .map_err(|_| TelegramError::InvalidMessage(message.to_string()))
}

/// Translate a teloxide failure into the channel error taxonomy.
pub fn map_request_error(e: RequestError) -> ChannelError {
    match e {
        RequestError::RetryAfter(secs) => ChannelError::RateLimited {
            retry_after_secs: u64::from(secs.seconds()),
        },
        RequestError::Api(ApiError::MessageToEditNotFound) => {
            ChannelError::NotFound("message to edit not found".to_string())
        }
        RequestError::Api(api) => ChannelError::Rejected(api.to_string()),
        RequestError::Network(e) => ChannelError::Transport(e.to_string()),
        RequestError::Io(e) => ChannelError::Transport(e.to_string()),
        other => ChannelError::Transport(other.to_string()),
    }
}
