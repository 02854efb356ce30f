use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Per-message limit used when `relay.limit` is not set.
/// Telegram's limit is 4096 characters; 4090 leaves room for safety.
pub const DEFAULT_MESSAGE_LIMIT: usize = 4090;
/// Shown in the first message of a relay until converted text arrives.
pub const DEFAULT_PLACEHOLDER: &str = "⏳ Converting document…";
pub const DEFAULT_MAX_SEND_ATTEMPTS: u32 = 3;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// The Bot API refuses downloads above 20 MB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Top-level config (docrelay.toml + DOCRELAY_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocrelayConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

/// Tuning for the incremental relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Maximum characters per chat message. Overrides the channel's own limit
    /// only when smaller.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Text of the message sent before the first converted text arrives.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Attempts per send or edit when the channel reports rate limiting.
    /// Other failures are never retried in place.
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            placeholder: default_placeholder(),
            max_send_attempts: default_max_send_attempts(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConverterMode {
    /// Stream converted text from the HTTP conversion service.
    #[default]
    Http,
    /// Deterministic two-fragment generator; no external service needed.
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default)]
    pub mode: ConverterMode,
    /// Endpoint receiving the raw document as the POST body. Required in `http` mode.
    pub url: Option<String>,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mode: ConverterMode::default(),
            url: None,
            api_key: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that downloaded documents are written to (and deleted from).
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_MESSAGE_LIMIT
}
fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}
fn default_max_send_attempts() -> u32 {
    DEFAULT_MAX_SEND_ATTEMPTS
}
fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_max_document_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}
fn default_download_dir() -> String {
    std::env::temp_dir()
        .join("docrelay")
        .to_string_lossy()
        .into_owned()
}

impl DocrelayConfig {
    /// Load config from a TOML file with DOCRELAY_* env var overrides.
    ///
    /// Nested keys use a double underscore: `DOCRELAY_RELAY__LIMIT=2000`.
    /// A missing file is not an error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let config = Self::extract(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load) but without validation, for callers that
    /// adjust the result before checking it.
    pub fn extract(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("DOCRELAY_").split("__"))
            .extract()
            .map_err(|e| crate::error::DocrelayError::Config(e.to_string()))
    }

    /// Reject values the relay cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::DocrelayError;

        if self.relay.limit == 0 {
            return Err(DocrelayError::Config(
                "relay.limit must be positive".to_string(),
            ));
        }
        if self.relay.placeholder.is_empty() {
            return Err(DocrelayError::Config(
                "relay.placeholder must not be empty".to_string(),
            ));
        }
        if self.relay.max_send_attempts == 0 {
            return Err(DocrelayError::Config(
                "relay.max_send_attempts must be at least 1".to_string(),
            ));
        }
        if self.converter.mode == ConverterMode::Http && self.converter.url.is_none() {
            return Err(DocrelayError::Config(
                "converter.url is required in http mode".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.docrelay/docrelay.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn loads_toml_with_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "docrelay.toml",
                r#"
                [telegram]
                bot_token = "123:abc"

                [converter]
                url = "http://localhost:8080/convert"
                "#,
            )?;
            let config = DocrelayConfig::load(Some("docrelay.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.telegram.bot_token, "123:abc");
            assert_eq!(config.relay.limit, DEFAULT_MESSAGE_LIMIT);
            assert_eq!(config.relay.max_send_attempts, DEFAULT_MAX_SEND_ATTEMPTS);
            assert_eq!(config.converter.mode, ConverterMode::Http);
            assert_eq!(config.storage.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "docrelay.toml",
                r#"
                [converter]
                mode = "synthetic"
                "#,
            )?;
            jail.set_env("DOCRELAY_RELAY__LIMIT", "2000");
            jail.set_env("DOCRELAY_TELEGRAM__BOT_TOKEN", "from-env");
            let config = DocrelayConfig::load(Some("docrelay.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.relay.limit, 2000);
            assert_eq!(config.telegram.bot_token, "from-env");
            assert_eq!(config.converter.mode, ConverterMode::Synthetic);
            Ok(())
        });
    }

    #[test]
    fn http_mode_without_url_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("docrelay.toml", "[relay]\nlimit = 100\n")?;
            let err = DocrelayConfig::load(Some("docrelay.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            assert!(err.to_string().contains("converter.url"));
            Ok(())
        });
    }

    #[test]
    fn extract_defers_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("docrelay.toml", "[relay]\nlimit = 100\n")?;
            let mut config =
                DocrelayConfig::extract(Some("docrelay.toml")).map_err(|e| e.to_string())?;
            assert!(config.validate().is_err());
            config.converter.mode = ConverterMode::Synthetic;
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = DocrelayConfig::default();
        config.converter.mode = ConverterMode::Synthetic;
        config.relay.limit = 0;
        assert!(config.validate().is_err());
    }
}
