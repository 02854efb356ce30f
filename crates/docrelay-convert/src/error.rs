/// Errors raised while setting up the conversion client.
///
/// Failures during a conversion are not represented here; they reach the
/// relay as a `ChunkEvent::Error`.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("converter.url is not configured")]
    NoUrl,

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
