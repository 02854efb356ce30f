//! Deterministic chunk source with fixed fragment sizes and pacing.
//!
//! Stands in for the conversion service in tests and local runs. The input
//! document is ignored.

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::source::{ChunkSource, ChunkStream};

/// Text the fragments are cut from, repeated as needed.
const SAMPLE_TEXT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.\n";

const REFERENCE_FRAGMENTS: usize = 2;
const REFERENCE_FRAGMENT_LEN: usize = 1024;
const REFERENCE_DELAY: Duration = Duration::from_millis(2000);

/// Emits `fragments` ASCII fragments of `fragment_len` bytes, `delay` apart,
/// then `End`. The first fragment is emitted immediately.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    fragments: usize,
    fragment_len: usize,
    delay: Duration,
}

impl SyntheticSource {
    pub fn new(fragments: usize, fragment_len: usize, delay: Duration) -> Self {
        Self {
            fragments,
            fragment_len,
            delay,
        }
    }

    /// Two 1024-byte fragments, 2000 ms apart.
    pub fn reference() -> Self {
        Self::new(REFERENCE_FRAGMENTS, REFERENCE_FRAGMENT_LEN, REFERENCE_DELAY)
    }

    /// Content of fragment `index`; fragments concatenate to a continuous text.
    pub fn fragment(&self, index: usize) -> Bytes {
        let bytes: Vec<u8> = SAMPLE_TEXT
            .bytes()
            .cycle()
            .skip(index * self.fragment_len)
            .take(self.fragment_len)
            .collect();
        Bytes::from(bytes)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::reference()
    }
}

impl ChunkSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn start(&self, _input: Bytes) -> ChunkStream {
        let (tx, stream) = ChunkStream::channel();
        let source = self.clone();

        tokio::spawn(async move {
            for index in 0..source.fragments {
                if index > 0 {
                    tokio::time::sleep(source.delay).await;
                }
                debug!(index, len = source.fragment_len, "synthetic: emitting fragment");
                if !tx.data(source.fragment(index)).await {
                    debug!("synthetic: consumer went away, stopping");
                    return;
                }
            }
            tx.end().await;
        });

        stream
    }
}
