//! Chunk sources and the event stream they produce.
//!
//! A source pushes [`ChunkEvent`]s into a bounded channel from its own task.
//! [`ChunkSender`] makes the terminal contract structural: `end` and `fail`
//! consume the sender, so at most one terminal event can ever be produced.
//! [`ChunkStream`] enforces the rest on the receiving side.

use bytes::Bytes;
use tokio::sync::mpsc;

/// Events buffered between a producer and the relay.
const STREAM_CAPACITY: usize = 32;

/// One event from a chunk source, consumed in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Raw fragment of converted text. Boundaries carry no meaning and may
    /// split a multi-byte character.
    Data(Bytes),

    /// The source finished normally. Always the last event.
    End,

    /// The source failed. Always the last event; no data follows it.
    Error(String),
}

impl ChunkEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChunkEvent::Data(_))
    }
}

/// Backend that converts a document into a stream of text fragments.
///
/// `start` must be called from within a Tokio runtime; implementations
/// spawn their producer and return immediately.
pub trait ChunkSource: Send + Sync {
    /// Short identifier used in logs (e.g. `"http"`, `"synthetic"`).
    fn name(&self) -> &str;

    fn start(&self, input: Bytes) -> ChunkStream;
}

/// Producer half of a chunk stream.
#[derive(Debug)]
pub struct ChunkSender {
    tx: mpsc::Sender<ChunkEvent>,
}

impl ChunkSender {
    /// Push a fragment. Returns `false` once the consumer has gone away, at
    /// which point the producer should stop.
    pub async fn data(&self, bytes: Bytes) -> bool {
        self.tx.send(ChunkEvent::Data(bytes)).await.is_ok()
    }

    /// Signal normal completion.
    pub async fn end(self) {
        let _ = self.tx.send(ChunkEvent::End).await;
    }

    /// Signal failure.
    pub async fn fail(self, cause: impl Into<String>) {
        let _ = self.tx.send(ChunkEvent::Error(cause.into())).await;
    }

    /// `true` when the consumer dropped its stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a chunk stream.
///
/// Yields events in the order they were produced and `None` after the first
/// terminal event. A producer that disappears without a terminal event is
/// reported as a single [`ChunkEvent::Error`].
#[derive(Debug)]
pub struct ChunkStream {
    rx: mpsc::Receiver<ChunkEvent>,
    finished: bool,
}

impl ChunkStream {
    /// Create a connected sender/stream pair.
    pub fn channel() -> (ChunkSender, ChunkStream) {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        (
            ChunkSender { tx },
            ChunkStream {
                rx,
                finished: false,
            },
        )
    }

    pub async fn next(&mut self) -> Option<ChunkEvent> {
        if self.finished {
            return None;
        }
        match self.rx.recv().await {
            Some(event) => {
                if event.is_terminal() {
                    self.finished = true;
                    self.rx.close();
                }
                Some(event)
            }
            None => {
                self.finished = true;
                Some(ChunkEvent::Error(
                    "chunk source stopped without an end signal".to_string(),
                ))
            }
        }
    }
}
