use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

pub const API_URL_ENV: &str = "CHATDECK_API_URL";
pub const USER_ID_ENV: &str = "CHATDECK_USER_ID";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the conversation service, including its `/api` prefix
    pub api_base_url: String,

    /// User whose conversations are listed and created
    pub user_id: String,

    /// Per-request timeout for the HTTP client
    pub request_timeout_secs: u64,

    /// UI preferences
    pub ui: UiConfig,

    /// Chatdeck home directory
    #[serde(skip)]
    pub chatdeck_home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub sidebar_open: bool,
    pub error_banner_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            error_banner_secs: 8,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_base_url: "http://localhost:8000/api".to_string(),
            user_id: "user1".to_string(),
            request_timeout_secs: 60,
            ui: UiConfig::default(),
            chatdeck_home: home.join(".chatdeck"),
        }
    }
}

impl Config {
    /// Load `~/.chatdeck/config.toml` (or defaults) and apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let chatdeck_home = home.join(".chatdeck");

        fs::create_dir_all(&chatdeck_home)
            .context("Failed to create .chatdeck directory")?;

        let mut config = Self::load_from(&chatdeck_home.join("config.toml"))?;
        config.chatdeck_home = chatdeck_home;
        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `CHATDECK_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(user) = lookup(USER_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.user_id = user;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.chatdeck_home.join("chatdeck.log")
    }
}
