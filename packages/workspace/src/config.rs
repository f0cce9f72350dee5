use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "abc.config.json";

/// Server configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Socket name; the path is derived from it
    #[serde(default = "default_socket_name")]
    pub socket_name: String,

    /// How long to wait on an existing socket before calling it stale
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Extensions (without the dot) of documents the server accepts
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
}

fn default_socket_name() -> String {
    "abc-ls".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    200
}

fn default_file_extensions() -> Vec<String> {
    vec!["abc".to_string()]
}

impl Config {
    /// Load config from a directory, falling back to defaults
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!("[Config] loaded {}", config_path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// True when `path` ends in one of the configured extensions
    pub fn accepts(&self, path: &str) -> bool {
        path.rsplit_once('.')
            .is_some_and(|(_, ext)| self.file_extensions.iter().any(|known| known == ext))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
            probe_timeout_ms: default_probe_timeout_ms(),
            file_extensions: default_file_extensions(),
        }
    }
}
