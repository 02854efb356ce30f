//! In-process output channel that keeps messages in a map.
//!
//! Used by tests across the workspace (enable the `test-util` feature).
//! Every call is recorded with the Tokio instant it was issued, and failures
//! can be scripted per call kind.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use docrelay_core::types::{Destination, MessageRef};

use crate::{channel::OutputChannel, error::ChannelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Send,
    Edit,
}

/// One recorded send/edit attempt, successful or not.
#[derive(Debug, Clone)]
pub struct ChannelCall {
    pub kind: CallKind,
    /// Target of an edit, or the message created by a successful send.
    pub message: Option<MessageRef>,
    pub text: String,
    pub at: Instant,
    pub succeeded: bool,
}

#[derive(Debug)]
struct StoredMessage {
    dest: Destination,
    text: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    messages: HashMap<u64, StoredMessage>,
    calls: Vec<ChannelCall>,
    send_failures: VecDeque<ChannelError>,
    edit_failures: VecDeque<ChannelError>,
}

/// Output channel backed by memory.
pub struct MemoryChannel {
    limit: usize,
    latency: Duration,
    inner: Mutex<Inner>,
}

impl MemoryChannel {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            latency: Duration::ZERO,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Delay every call by `latency` before it takes effect.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next send fail with `err`. Failures queue up in call order.
    pub fn fail_next_send(&self, err: ChannelError) {
        self.lock().send_failures.push_back(err);
    }

    /// Make the next edit fail with `err`. Failures queue up in call order.
    pub fn fail_next_edit(&self, err: ChannelError) {
        self.lock().edit_failures.push_back(err);
    }

    /// Remove a message, as if a user deleted it.
    pub fn delete(&self, message: &MessageRef) {
        if let Ok(id) = message.as_str().parse::<u64>() {
            self.lock().messages.remove(&id);
        }
    }

    /// Current content of `message`, if it still exists.
    pub fn text_of(&self, message: &MessageRef) -> Option<String> {
        let id = message.as_str().parse::<u64>().ok()?;
        self.lock().messages.get(&id).map(|m| m.text.clone())
    }

    /// Contents of all live messages in `dest`, oldest first.
    pub fn transcript(&self, dest: &Destination) -> Vec<String> {
        let inner = self.lock();
        let mut ids: Vec<u64> = inner
            .messages
            .iter()
            .filter(|(_, m)| &m.dest == dest)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids.iter().map(|id| inner.messages[id].text.clone()).collect()
    }

    /// Snapshot of every recorded call.
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.lock().calls.clone()
    }

    /// Number of successful sends.
    pub fn sent_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind == CallKind::Send && c.succeeded)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_length(&self, text: &str) -> Result<(), ChannelError> {
        let len = text.chars().count();
        if len > self.limit {
            return Err(ChannelError::Rejected(format!(
                "message is too long: {len} > {}",
                self.limit
            )));
        }
        if text.is_empty() {
            return Err(ChannelError::Rejected("message text is empty".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for MemoryChannel {
    fn name(&self) -> &str {
        "memory"
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<MessageRef, ChannelError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut inner = self.lock();
        let at = Instant::now();

        let outcome = match inner.send_failures.pop_front() {
            Some(err) => Err(err),
            None => self.check_length(text),
        };
        if let Err(err) = outcome {
            inner.calls.push(ChannelCall {
                kind: CallKind::Send,
                message: None,
                text: text.to_string(),
                at,
                succeeded: false,
            });
            return Err(err);
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.messages.insert(
            id,
            StoredMessage {
                dest: dest.clone(),
                text: text.to_string(),
            },
        );
        let message = MessageRef(id.to_string());
        inner.calls.push(ChannelCall {
            kind: CallKind::Send,
            message: Some(message.clone()),
            text: text.to_string(),
            at,
            succeeded: true,
        });
        Ok(message)
    }

    async fn edit(
        &self,
        dest: &Destination,
        message: &MessageRef,
        text: &str,
    ) -> Result<(), ChannelError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut inner = self.lock();
        let at = Instant::now();

        let outcome = match inner.edit_failures.pop_front() {
            Some(err) => Err(err),
            None => self.check_length(text).and_then(|()| {
                message
                    .as_str()
                    .parse::<u64>()
                    .ok()
                    .filter(|id| {
                        inner
                            .messages
                            .get(id)
                            .is_some_and(|stored| &stored.dest == dest)
                    })
                    .ok_or_else(|| ChannelError::NotFound(message.to_string()))
            }),
        };

        let succeeded = outcome.is_ok();
        if let Ok(id) = &outcome {
            if let Some(stored) = inner.messages.get_mut(id) {
                stored.text = text.to_string();
            }
        }
        inner.calls.push(ChannelCall {
            kind: CallKind::Edit,
            message: Some(message.clone()),
            text: text.to_string(),
            at,
            succeeded,
        });
        outcome.map(|_| ())
    }
}
