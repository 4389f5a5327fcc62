// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `$XDG_CONFIG_HOME/commz/config.toml` and includes:
//! - `gateway_url`: HTTP base URL of the gateway
//! - `push_url` / `ai_url`: WebSocket endpoints, derived from the gateway when absent
//! - `token`: auth token sent as the `commz-token` cookie (`COMMZ_TOKEN` overrides)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use commz_core::StreamKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "commz";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV: &str = "COMMZ_TOKEN";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway base URL (default: "http://localhost:4242").
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Push channel URL. Derived from `gateway_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    /// AI stream base URL. Derived from `gateway_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_url: Option<String>,
    /// Wait between a push channel close and the next connect (default: 3000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Messages per history page (default: 30).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_gateway_url() -> String {
    "http://localhost:4242".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_page_size() -> usize {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            gateway_url: default_gateway_url(),
            push_url: None,
            ai_url: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
        }
    }
}

impl ClientConfig {
    /// Path of the user config file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the user config file and applies environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_token_override(std::env::var(TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Replaces the token with `token` when it is set and non-empty.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
    }

    /// Checks URLs and numeric limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !has_scheme(&self.gateway_url, &["http://", "https://"]) {
            return Err(ConfigError::Invalid(format!(
                "gateway_url '{}' must start with http:// or https://",
                self.gateway_url
            )));
        }
        for (name, url) in [("push_url", &self.push_url), ("ai_url", &self.ai_url)] {
            if let Some(url) = url {
                if !has_scheme(url, &["ws://", "wss://"]) {
                    return Err(ConfigError::Invalid(format!(
                        "{name} '{url}' must start with ws:// or wss://"
                    )));
                }
            }
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        Ok(())
    }

    /// URL of the push channel.
    pub fn push_url(&self) -> String {
        match &self.push_url {
            Some(url) => url.clone(),
            None => format!("{}/ws", self.websocket_base()),
        }
    }

    /// Base URL below which each AI stream kind has its endpoint.
    pub fn ai_base_url(&self) -> String {
        match &self.ai_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/ai", self.websocket_base()),
        }
    }

    /// URL of the AI stream endpoint for `kind`.
    pub fn ai_url(&self, kind: StreamKind) -> String {
        format!("{}/{}", self.ai_base_url(), kind.path())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The gateway URL with its scheme switched to ws/wss.
    fn websocket_base(&self) -> String {
        let gateway = self.gateway_url.trim_end_matches('/');
        if let Some(rest) = gateway.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = gateway.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            gateway.to_string()
        }
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|s| url.strip_prefix(s).is_some_and(|rest| !rest.is_empty()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
