//! Document download through the Bot API into the local download directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use tracing::{debug, warn};

use docrelay_core::config::StorageConfig;
use docrelay_core::types::RelayId;
use docrelay_core::{DocrelayError, Result};
use docrelay_relay::FileStore;

/// [`FileStore`] backed by `getFile` + `download_file`.
///
/// Every download gets a fresh name so concurrent relays of the same
/// document never share a file.
pub struct TelegramFileStore {
    bot: Bot,
    dir: PathBuf,
    max_bytes: u64,
}

impl TelegramFileStore {
    pub fn new(bot: Bot, config: &StorageConfig) -> Self {
        Self {
            bot,
            dir: PathBuf::from(&config.download_dir),
            max_bytes: config.max_document_bytes,
        }
    }
}

#[async_trait]
impl FileStore for TelegramFileStore {
    async fn download(&self, file_id: &str) -> Result<PathBuf> {
        let file = self
            .bot
            .get_file(file_id.to_string())
            .await
            .map_err(|e| channel_error("getFile", e))?;

        let size = u64::from(file.size);
        check_size(size, self.max_bytes)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.bin", RelayId::new()));
        let mut dst = tokio::fs::File::create(&path).await?;

        if let Err(e) = self.bot.download_file(&file.path, &mut dst).await {
            drop(dst);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %rm, "failed to remove partial download");
            }
            return Err(channel_error("download_file", e));
        }
        debug!(file_id, size, path = %path.display(), "telegram: document downloaded");
        Ok(path)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

fn check_size(size: u64, max: u64) -> Result<()> {
    if size > max {
        return Err(DocrelayError::PayloadTooLarge { size, max });
    }
    Ok(())
}

fn channel_error(op: &str, e: impl std::fmt::Display) -> DocrelayError {
    DocrelayError::Channel {
        channel: "telegram".to_string(),
        reason: format!("{op}: {e}"),
    }
}
