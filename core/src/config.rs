//! Client configuration.
//!
//! Defaults point at the production backend. Hosts layer their own sources
//! (flags, `KAMI_*` variables, a JSON file) over these defaults and call
//! `validate` before building a client.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://kami-backend-5rs0.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Host spelled without the hyphen. It does not resolve to the backend.
const MISSPELLED_HOST: &str = "kami-backend5rs0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// File backing the persisted login token.
    pub token_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: default_token_path(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `$HOME/.kami/session.json`, or the temp dir when `HOME` is unset.
pub fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".kami")
        .join("session.json")
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.base_url.clone()));
        }
        if url.contains(MISSPELLED_HOST) {
            return Err(ConfigError::MisspelledHost(self.base_url.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
