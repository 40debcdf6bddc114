use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Connection settings for the guide service
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the `/tourist-guide` path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Optional transport timeout in seconds; no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl ClientConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with TOURIST_GUIDE__ prefix
    /// 2. tourist-guide.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: TOURIST_GUIDE__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("tourist-guide")
    }

    /// Same as [`ClientConfig::load`] but reads the optional file at `file`
    /// (extension may be omitted) instead of `tourist-guide.toml`
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("TOURIST_GUIDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        let base_url = config.base_url.clone();
        Ok(config.with_base_url(base_url))
    }

    /// Replace the base URL, dropping any trailing slash
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
