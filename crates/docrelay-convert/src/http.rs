//! Streaming client for the HTTP conversion service.
//!
//! The document is POSTed as the raw request body; the service answers with a
//! (usually chunked) `text/plain` body that grows as conversion progresses.
//! Each body chunk becomes one `ChunkEvent::Data`, untouched: chunk
//! boundaries may split UTF-8 characters and the relay decoder handles that.

use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tracing::{debug, warn};

use docrelay_core::config::ConverterConfig;
use docrelay_relay::{ChunkSender, ChunkSource, ChunkStream};

use crate::error::ConvertError;

/// Conversion service client. Cheap to share; one instance serves all relays.
#[derive(Debug, Clone)]
pub struct HttpConverter {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpConverter {
    /// Only the connection attempt is bounded by a timeout; a conversion may
    /// pause for arbitrarily long between chunks.
    pub fn new(config: &ConverterConfig) -> Result<Self, ConvertError> {
        let url = config.url.clone().ok_or(ConvertError::NoUrl)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, input: Bytes) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(input);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

impl ChunkSource for HttpConverter {
    fn name(&self) -> &str {
        "http"
    }

    fn start(&self, input: Bytes) -> ChunkStream {
        let (tx, stream) = ChunkStream::channel();
        tokio::spawn(forward_body(self.request(input), tx));
        stream
    }
}

/// Send the request and forward the response body into `tx`.
async fn forward_body(request: reqwest::RequestBuilder, tx: ChunkSender) {
    let resp = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "conversion request failed");
            tx.fail(format!("conversion request failed: {e}")).await;
            return;
        }
    };

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, "conversion service returned an error");
        tx.fail(format!("conversion service returned {status}: {}", body.trim()))
            .await;
        return;
    }

    let mut byte_stream = resp.bytes_stream();
    let mut total = 0usize;

    while let Some(chunk) = byte_stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, received = total, "conversion stream broke off");
                tx.fail(format!("conversion stream broke off: {e}")).await;
                return;
            }
        };
        if chunk.is_empty() {
            continue;
        }
        total += chunk.len();
        if !tx.data(chunk).await {
            debug!("relay went away, dropping conversion stream");
            return;
        }
    }

    debug!(bytes = total, "conversion stream complete");
    tx.end().await;
}
