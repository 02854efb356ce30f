//! Incremental relay of streamed document text into a length-limited chat.
//!
//! A [`ChunkSource`] produces byte fragments; [`run_relay`] decodes them and
//! drives a [`Relay`], which maps the growing text onto edits of the open
//! message or rollovers to new messages.

pub mod decode;
pub mod error;
pub mod pipeline;
pub mod relay;
pub mod source;
pub mod state;
pub mod synthetic;

pub use decode::Utf8Decoder;
pub use error::RelayError;
pub use pipeline::{relay_document, FileStore};
pub use relay::{run_relay, Relay, RelayOutcome, RelayReport, RelaySettings};
pub use source::{ChunkEvent, ChunkSender, ChunkSource, ChunkStream};
pub use state::{RelayPhase, RelayState};
pub use synthetic::SyntheticSource;
