pub mod config;
pub mod error;
pub mod types;

pub use config::DocrelayConfig;
pub use error::{DocrelayError, Result};
pub use types::{Destination, MessageRef, RelayId};
