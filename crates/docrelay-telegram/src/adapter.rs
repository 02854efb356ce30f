//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event
//! loop until the process is asked to stop.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use docrelay_channels::OutputChannel;
use docrelay_core::config::{RelayConfig, StorageConfig, TelegramConfig};
use docrelay_relay::{ChunkSource, RelaySettings};
use tokio_util::sync::CancellationToken;

use crate::channel::TelegramChannel;
use crate::error::TelegramError;
use crate::files::TelegramFileStore;
use crate::handler::{handle_message, RelayContext};

/// Telegram bot that relays converted documents back into the chat.
pub struct TelegramAdapter {
    bot: Bot,
    ctx: Arc<RelayContext>,
}

impl TelegramAdapter {
    pub fn new(
        telegram: &TelegramConfig,
        relay: &RelayConfig,
        storage: &StorageConfig,
        source: Arc<dyn ChunkSource>,
    ) -> Result<Self, TelegramError> {
        if telegram.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        let bot = Bot::new(&telegram.bot_token);
        let channel = TelegramChannel::new(bot.clone());
        let settings = RelaySettings::new(relay, &channel);
        let store = TelegramFileStore::new(bot.clone(), storage);

        let ctx = RelayContext::new(
            Arc::new(channel) as Arc<dyn OutputChannel>,
            Arc::new(store),
            source,
            settings,
            CancellationToken::new(),
        );
        Ok(Self {
            bot,
            ctx: Arc::new(ctx),
        })
    }

    /// Connect to Telegram and drive the long-polling loop.
    ///
    /// Returns after Ctrl-C, once relays still in flight have been cancelled
    /// and their downloads deleted.
    pub async fn run(self) {
        info!("Telegram: starting long-polling dispatcher");

        let handler = Update::filter_message().endpoint(handle_message);
        let ctx = Arc::clone(&self.ctx);

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![ctx])
            .default_handler(|_upd| async {})
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped, cancelling running relays");
        self.ctx.shutdown().await;
        info!("Telegram: all relays finished");
    }
}
