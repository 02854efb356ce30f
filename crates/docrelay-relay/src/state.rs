use docrelay_core::types::MessageRef;

/// Lifecycle of a single document relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    /// Created, not started.
    Idle,
    /// Started; no output message exists yet.
    AwaitingFirstChunk,
    /// An output message is open and the buffer may still grow.
    Streaming,
    /// End, error or cancellation received. No further transitions.
    Terminated,
}

/// Mutable state of one relay, owned by its [`Relay`](crate::relay::Relay).
///
/// Invariant: outside of a transition, `buffer` holds at most `limit`
/// characters and is the intended content of `open_message`.
#[derive(Debug, Clone)]
pub struct RelayState {
    phase: RelayPhase,
    open_message: Option<MessageRef>,
    buffer: String,
    /// Content the channel last acknowledged for `open_message`.
    displayed: String,
    limit: usize,
}

impl RelayState {
    /// `limit` is clamped to at least one character.
    pub fn new(limit: usize) -> Self {
        Self {
            phase: RelayPhase::Idle,
            open_message: None,
            buffer: String::new(),
            displayed: String::new(),
            limit: limit.max(1),
        }
    }

    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    pub fn open_message(&self) -> Option<&MessageRef> {
        self.open_message.as_ref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Buffer length in characters.
    pub fn buffer_len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// `true` when the open message does not yet show the whole buffer.
    pub fn needs_edit(&self) -> bool {
        self.open_message.is_some() && self.displayed != self.buffer
    }

    pub(crate) fn displayed(&self) -> &str {
        &self.displayed
    }

    pub(crate) fn begin(&mut self) {
        if self.phase == RelayPhase::Idle {
            self.phase = RelayPhase::AwaitingFirstChunk;
        }
    }

    /// Record the first message of the relay, currently showing `shown`.
    pub(crate) fn open(&mut self, message: MessageRef, shown: String) {
        self.open_message = Some(message);
        self.displayed = shown;
        self.phase = RelayPhase::Streaming;
    }

    pub(crate) fn append(&mut self, delta: &str) {
        self.buffer.push_str(delta);
    }

    /// Split an over-limit buffer into the part that fits the open message
    /// and the overflow past it. `None` when the buffer fits.
    pub(crate) fn overflow(&self) -> Option<(&str, &str)> {
        let (head, tail) = split_at_char(&self.buffer, self.limit);
        if tail.is_empty() {
            None
        } else {
            Some((head, tail))
        }
    }

    /// Freeze the open message and continue in `message`, which shows `shown`.
    /// The buffer becomes the overflow past the old limit boundary.
    pub(crate) fn roll_over(&mut self, message: MessageRef, shown: String) {
        let (_, tail) = split_at_char(&self.buffer, self.limit);
        self.buffer = tail.to_string();
        self.open_message = Some(message);
        self.displayed = shown;
    }

    pub(crate) fn mark_displayed(&mut self, shown: String) {
        self.displayed = shown;
    }

    /// Enter the terminal phase and release the buffer.
    pub(crate) fn terminate(&mut self) {
        self.phase = RelayPhase::Terminated;
        self.buffer = String::new();
        self.displayed = String::new();
    }
}

/// Split `s` after `n` characters. Never cuts inside a character.
pub(crate) fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}
