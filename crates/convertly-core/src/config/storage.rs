//! Object storage and transformation tooling configuration.

use serde::{Deserialize, Serialize};

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for locally stored objects.
    #[serde(default = "default_root")]
    pub root: String,
    /// Lifetime of signed download URLs in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_seconds: u64,
    /// Command used for office document format conversion.
    #[serde(default = "default_office_command")]
    pub office_command: String,
    /// Timeout for a single office conversion subprocess, in seconds.
    #[serde(default = "default_convert_timeout")]
    pub convert_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            url_ttl_seconds: default_url_ttl(),
            office_command: default_office_command(),
            convert_timeout_seconds: default_convert_timeout(),
        }
    }
}

fn default_root() -> String {
    "data/objects".to_string()
}

fn default_url_ttl() -> u64 {
    3600
}

fn default_office_command() -> String {
    "soffice".to_string()
}

fn default_convert_timeout() -> u64 {
    300
}
