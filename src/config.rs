//! Configuration loading and management
//!
//! Handles parsing of `.taskdeck.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file at the deck root
pub const CONFIG_FILE: &str = ".taskdeck.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Remote user API configuration
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Session log configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Kanban board configuration
    #[serde(default)]
    pub board: BoardConfig,
}

/// Store-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory, relative to the deck root
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    crate::storage::STORE_DIR.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// Remote user API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the user API; unset means local data only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            users_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Session log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Address recorded on log entries
    #[serde(default = "default_ip_address")]
    pub ip_address: String,

    /// Number of token characters kept in `tokenName`
    #[serde(default = "default_token_preview_len")]
    pub token_preview_len: usize,
}

fn default_ip_address() -> String {
    "127.0.0.1".to_string()
}

fn default_token_preview_len() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ip_address: default_ip_address(),
            token_preview_len: default_token_preview_len(),
        }
    }
}

/// Kanban board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Highest progress still shown in "To Do"
    #[serde(default = "default_todo_max")]
    pub todo_max: f64,

    /// Highest progress still shown in "In Progress"
    #[serde(default = "default_in_progress_max")]
    pub in_progress_max: f64,
}

fn default_todo_max() -> f64 {
    40.0
}

fn default_in_progress_max() -> f64 {
    80.0
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            todo_max: default_todo_max(),
            in_progress_max: default_in_progress_max(),
        }
    }
}

impl Config {
    /// Load configuration from a `.taskdeck.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the deck root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute path of the store directory for a deck root
    pub fn store_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.store.dir)
    }

    fn validate(&self) -> Result<()> {
        if self.store.dir.trim().is_empty() {
            return Err(Error::InvalidConfig("store.dir cannot be empty".to_string()));
        }
        if let Some(url) = self.remote.users_url.as_deref() {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!(
                    "remote.users_url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.remote.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "remote.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.session.ip_address.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "session.ip_address cannot be empty".to_string(),
            ));
        }
        if self.session.token_preview_len == 0 {
            return Err(Error::InvalidConfig(
                "session.token_preview_len must be > 0".to_string(),
            ));
        }
        self.board.validate()
    }
}

impl BoardConfig {
    fn validate(&self) -> Result<()> {
        if !self.todo_max.is_finite() || !self.in_progress_max.is_finite() {
            return Err(Error::InvalidConfig(
                "board thresholds must be finite numbers".to_string(),
            ));
        }
        if self.todo_max < 0.0 {
            return Err(Error::InvalidConfig(
                "board.todo_max must be >= 0".to_string(),
            ));
        }
        if self.in_progress_max <= self.todo_max {
            return Err(Error::InvalidConfig(format!(
                "board.in_progress_max ({}) must be greater than board.todo_max ({})",
                self.in_progress_max, self.todo_max
            )));
        }
        Ok(())
    }
}
