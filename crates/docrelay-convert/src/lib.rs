pub mod error;
pub mod http;

pub use error::ConvertError;
pub use http::HttpConverter;

use docrelay_core::config::{ConverterConfig, ConverterMode};
use docrelay_relay::{ChunkSource, SyntheticSource};

/// Build the chunk source selected by `converter.mode`.
pub fn build_source(config: &ConverterConfig) -> Result<Box<dyn ChunkSource>, ConvertError> {
    match config.mode {
        ConverterMode::Http => Ok(Box::new(HttpConverter::new(config)?)),
        ConverterMode::Synthetic => Ok(Box::new(SyntheticSource::reference())),
    }
}
