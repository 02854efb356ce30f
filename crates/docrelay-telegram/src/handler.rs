//! Telegram message handler registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use docrelay_channels::OutputChannel;
use docrelay_core::types::Destination;
use docrelay_relay::{relay_document, ChunkSource, FileStore, RelayReport, RelaySettings};

/// Reply to `/start`.
pub const GREETING: &str = "Hello, I am your Telegram bot!";

/// Everything a relay needs, shared by all handler invocations.
pub struct RelayContext {
    channel: Arc<dyn OutputChannel>,
    store: Arc<dyn FileStore>,
    source: Arc<dyn ChunkSource>,
    settings: RelaySettings,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl RelayContext {
    pub fn new(
        channel: Arc<dyn OutputChannel>,
        store: Arc<dyn FileStore>,
        source: Arc<dyn ChunkSource>,
        settings: RelaySettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            channel,
            store,
            source,
            settings,
            shutdown,
            tasks: TaskTracker::new(),
        }
    }

    /// Run [`relay`](Self::relay) in its own task.
    pub fn spawn_relay(self: &Arc<Self>, dest: Destination, file_id: String) {
        let ctx = Arc::clone(self);
        self.tasks.spawn(async move {
            ctx.relay(&dest, &file_id).await;
        });
    }

    /// Cancel every running relay and wait until each has cleaned up its
    /// downloaded file.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// Relay the document `file_id` into `dest`.
    ///
    /// A failed relay is reported to the chat with a single notification.
    pub async fn relay(&self, dest: &Destination, file_id: &str) -> Option<RelayReport> {
        let result = relay_document(
            self.store.as_ref(),
            self.source.as_ref(),
            self.channel.as_ref(),
            dest,
            file_id,
            self.settings.clone(),
            &self.shutdown,
        )
        .await;

        match result {
            Ok(report) => {
                info!(
                    destination = %dest,
                    outcome = ?report.outcome,
                    messages = report.messages.len(),
                    chars = report.chars_relayed,
                    edits_failed = report.edits_failed,
                    "relay finished"
                );
                Some(report)
            }
            Err(e) => {
                warn!(destination = %dest, code = e.code(), error = %e, "relay failed");
                if let Err(notify) = self.channel.send(dest, &e.user_message()).await {
                    warn!(destination = %dest, error = %notify, "could not deliver failure notice");
                }
                None
            }
        }
    }
}

/// Main message handler registered in the teloxide Dispatcher.
///
/// Documents are relayed in their own task so the dispatcher keeps serving
/// other chats; `/start` gets a greeting; anything else is ignored.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    ctx: Arc<RelayContext>,
) -> ResponseResult<()> {
    if msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false) {
        return Ok(());
    }

    if let Some(doc) = msg.document() {
        let dest = Destination::from(msg.chat.id.0);
        let file_id = doc.file.id.to_string();
        info!(
            chat_id = msg.chat.id.0,
            file_name = doc.file_name.as_deref().unwrap_or(""),
            size = doc.file.size,
            "document received"
        );
        ctx.spawn_relay(dest, file_id);
        return Ok(());
    }

    if msg.text().is_some_and(is_start_command) {
        bot.send_message(msg.chat.id, GREETING).await?;
    }
    Ok(())
}

/// `/start`, optionally addressed (`/start@bot`) or with a payload.
fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    let command = command.split('@').next().unwrap_or("");
    command == "/start"
}
