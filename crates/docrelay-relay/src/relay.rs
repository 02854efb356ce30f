//! The relay state machine and its event loop.
//!
//! For every decoded text increment the open message is either edited to
//! show the whole buffer or, once the buffer passes the channel limit,
//! frozen at the limit boundary while the overflow moves into a new message.
//! All channel calls of one relay are awaited in order; none overlap.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use docrelay_channels::{edit_with_retry, send_with_retry, ChannelError, OutputChannel};
use docrelay_core::config::RelayConfig;
use docrelay_core::types::{Destination, MessageRef};

use crate::decode::Utf8Decoder;
use crate::error::RelayError;
use crate::source::{ChunkEvent, ChunkStream};
use crate::state::{split_at_char, RelayPhase, RelayState};

/// Per-relay tuning, derived from config and the channel.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub limit: usize,
    pub placeholder: String,
    pub max_send_attempts: u32,
}

impl RelaySettings {
    /// Use the configured limit, but never more than the channel accepts.
    pub fn new(config: &RelayConfig, channel: &dyn OutputChannel) -> Self {
        Self {
            limit: config.limit.min(channel.limit()),
            placeholder: config.placeholder.clone(),
            max_send_attempts: config.max_send_attempts,
        }
    }
}

/// How a relay that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed,
    Cancelled,
}

/// Summary of a finished relay.
#[derive(Debug, Clone)]
pub struct RelayReport {
    pub outcome: RelayOutcome,
    /// Every message the relay created, in rollover order.
    pub messages: Vec<MessageRef>,
    pub edits_applied: usize,
    pub edits_failed: usize,
    /// Characters of decoded text accepted.
    pub chars_relayed: usize,
}

impl Default for RelayReport {
    fn default() -> Self {
        Self {
            outcome: RelayOutcome::Completed,
            messages: Vec::new(),
            edits_applied: 0,
            edits_failed: 0,
            chars_relayed: 0,
        }
    }
}

/// One document relay: its state plus the channel it writes to.
///
/// Transitions go through `&mut self`, so no other task can observe a
/// half-updated [`RelayState`].
pub struct Relay<'a> {
    channel: &'a dyn OutputChannel,
    dest: Destination,
    settings: RelaySettings,
    state: RelayState,
    report: RelayReport,
    /// Rolled-over messages whose final edit has not landed yet.
    unfrozen: Vec<(MessageRef, String)>,
}

impl<'a> Relay<'a> {
    pub fn new(channel: &'a dyn OutputChannel, dest: Destination, settings: RelaySettings) -> Self {
        let state = RelayState::new(settings.limit);
        Self {
            channel,
            dest,
            settings,
            state,
            report: RelayReport::default(),
            unfrozen: Vec::new(),
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn report(&self) -> &RelayReport {
        &self.report
    }

    /// Idle → AwaitingFirstChunk.
    pub fn begin(&mut self) {
        self.state.begin();
    }

    /// Apply one decoded increment. Empty increments are ignored.
    ///
    /// Returns an error only when a send fails, which leaves the relay
    /// without a message it could continue in; the state is terminated.
    pub async fn apply(&mut self, delta: &str) -> Result<(), RelayError> {
        if delta.is_empty() || self.state.phase() == RelayPhase::Terminated {
            return Ok(());
        }
        self.state.begin();
        self.settle().await;

        if self.state.open_message().is_none() {
            let (placeholder, _) = split_at_char(&self.settings.placeholder, self.state.limit());
            let placeholder = placeholder.to_string();
            let message = self.send(&placeholder).await?;
            debug!(message_ref = %message, "opened first message");
            self.state.open(message, placeholder);
        }

        self.state.append(delta);
        self.report.chars_relayed += delta.chars().count();

        while let Some((head, tail)) = self.state.overflow() {
            let head = head.to_string();
            let (segment, _) = split_at_char(tail, self.state.limit());
            let segment = segment.to_string();

            if self.state.displayed() != head {
                self.freeze_open(head).await;
            }
            let message = self.send(&segment).await?;
            debug!(message_ref = %message, "rolled over to new message");
            self.state.roll_over(message, segment);
        }

        if self.state.needs_edit() {
            let content = self.state.buffer().to_string();
            self.edit_open(content).await;
        }
        Ok(())
    }

    /// Retry the final edits of rolled-over messages that have not landed.
    ///
    /// Does nothing once every earlier message shows its full content.
    pub async fn settle(&mut self) {
        if self.unfrozen.is_empty() || self.state.phase() == RelayPhase::Terminated {
            return;
        }
        for (message, content) in std::mem::take(&mut self.unfrozen) {
            self.freeze(message, content).await;
        }
    }

    /// Normal end of input. The last edit already shows the final content.
    pub fn finish(mut self) -> RelayReport {
        self.state.terminate();
        self.report.outcome = RelayOutcome::Completed;
        self.report
    }

    /// Caller abandoned the relay; no further calls are made.
    pub fn cancel(mut self) -> RelayReport {
        self.state.terminate();
        self.report.outcome = RelayOutcome::Cancelled;
        self.report
    }

    async fn send(&mut self, text: &str) -> Result<MessageRef, RelayError> {
        match send_with_retry(self.channel, &self.dest, text, self.settings.max_send_attempts).await
        {
            Ok(message) => {
                self.report.messages.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                self.state.terminate();
                Err(RelayError::ChannelSend(e))
            }
        }
    }

    /// Bring the open message to its final content before rolling over.
    async fn freeze_open(&mut self, content: String) {
        if let Some(message) = self.state.open_message().cloned() {
            self.freeze(message, content).await;
        }
    }

    /// Edit a message that will not be touched by later increments. A
    /// transient failure keeps it queued for [`settle`](Self::settle).
    async fn freeze(&mut self, message: MessageRef, content: String) {
        match self.edit(&message, &content).await {
            Err(ChannelError::RateLimited { .. } | ChannelError::Transport(_)) => {
                self.unfrozen.push((message, content));
            }
            Ok(()) | Err(_) => {}
        }
    }

    /// Show `content` in the open message. Failures are logged, not fatal:
    /// the next increment retries with the then-current content.
    async fn edit_open(&mut self, content: String) {
        let Some(message) = self.state.open_message().cloned() else {
            return;
        };
        if self.edit(&message, &content).await.is_ok() {
            self.state.mark_displayed(content);
        }
    }

    async fn edit(&mut self, message: &MessageRef, content: &str) -> Result<(), ChannelError> {
        let result = edit_with_retry(
            self.channel,
            &self.dest,
            message,
            content,
            self.settings.max_send_attempts,
        )
        .await;
        match &result {
            Ok(()) => self.report.edits_applied += 1,
            Err(e) => {
                self.report.edits_failed += 1;
                warn!(
                    channel = %self.channel.name(),
                    message_ref = %message,
                    error = %e,
                    code = e.code(),
                    "edit failed, continuing"
                );
            }
        }
        result
    }
}

/// Drive a relay from `stream` until it ends, fails or `cancel` fires.
///
/// Cancellation is only observed while waiting for the next event, so a
/// channel call that has started always runs to completion.
pub async fn run_relay(
    mut stream: ChunkStream,
    channel: &dyn OutputChannel,
    dest: &Destination,
    settings: RelaySettings,
    cancel: &CancellationToken,
) -> Result<RelayReport, RelayError> {
    let mut relay = Relay::new(channel, dest.clone(), settings);
    let mut decoder = Utf8Decoder::new();
    relay.begin();

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("relay cancelled");
                return Ok(relay.cancel());
            }
            event = stream.next() => event,
        };

        match event {
            Some(ChunkEvent::Data(bytes)) => {
                let text = decoder.push(&bytes);
                relay.apply(&text).await?;
            }
            Some(ChunkEvent::End) | None => {
                let tail = decoder.finish();
                relay.apply(&tail).await?;
                relay.settle().await;
                let report = relay.finish();
                info!(
                    messages = report.messages.len(),
                    chars = report.chars_relayed,
                    edits_failed = report.edits_failed,
                    "relay completed"
                );
                return Ok(report);
            }
            Some(ChunkEvent::Error(cause)) => {
                warn!(error = %cause, "chunk source failed, abandoning relay");
                relay.cancel();
                return Err(RelayError::Source(cause));
            }
        }
    }
}
