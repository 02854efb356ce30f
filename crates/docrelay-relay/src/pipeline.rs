//! Download → convert → relay → delete, for one received document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use docrelay_channels::OutputChannel;
use docrelay_core::types::{Destination, RelayId};
use docrelay_core::DocrelayError;

use crate::error::RelayError;
use crate::relay::{run_relay, RelayReport, RelaySettings};
use crate::source::ChunkSource;

/// Local storage for documents while they are being converted.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fetch the platform file `file_id` to a local path.
    async fn download(&self, file_id: &str) -> docrelay_core::Result<PathBuf>;

    /// Remove a previously downloaded file.
    async fn delete(&self, path: &Path) -> docrelay_core::Result<()>;
}

/// Relay one document end to end.
///
/// The downloaded file is deleted once the relay has finished, whether it
/// completed, failed or was cancelled.
pub async fn relay_document(
    store: &dyn FileStore,
    source: &dyn ChunkSource,
    channel: &dyn OutputChannel,
    dest: &Destination,
    file_id: &str,
    settings: RelaySettings,
    cancel: &CancellationToken,
) -> Result<RelayReport, RelayError> {
    let relay_id = RelayId::new();
    let span = info_span!("relay", relay_id = %relay_id, destination = %dest, source = source.name());

    async move {
        let path = store.download(file_id).await?;
        info!(path = %path.display(), "document downloaded");

        let result = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stream = source.start(Bytes::from(bytes));
                run_relay(stream, channel, dest, settings, cancel).await
            }
            Err(e) => Err(RelayError::Document(DocrelayError::Io(e))),
        };

        if let Err(e) = store.delete(&path).await {
            warn!(path = %path.display(), error = %e, "failed to delete downloaded document");
        }
        result
    }
    .instrument(span)
    .await
}
