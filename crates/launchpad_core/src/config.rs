use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the console API bearer token.
pub const API_TOKEN_ENV: &str = "LAUNCHPAD_API_TOKEN";
/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "LAUNCHPAD_API_URL";

// ---------------------------------------------------------------------------
// ConsoleConfig
// ---------------------------------------------------------------------------

/// Console configuration stored at `~/.launchpad/config.json`.
///
/// The API token is **never** written to the JSON file. It is read from
/// [`API_TOKEN_ENV`] by [`ConsoleConfig::apply_env`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    #[serde(skip)]
    pub api_token: Option<String>,

    /// Base URL of the provisioning backend, without a trailing slash.
    pub api_base_url: String,
    /// Resource (stack) that owns new deployments. When unset the backend's
    /// default resource is resolved on first submission.
    pub default_resource_id: Option<String>,

    // Job polling
    pub poll_interval_ms: u64,
    /// `None` tolerates dropped polls forever.
    pub max_consecutive_poll_failures: Option<u32>,

    // Wallet probes
    pub probe_debounce_ms: u64,

    // Transport
    pub request_timeout_secs: u64,

    // General
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            api_base_url: "http://localhost:8000".into(),
            default_resource_id: None,
            poll_interval_ms: 2_000,
            max_consecutive_poll_failures: None,
            probe_debounce_ms: 500,
            request_timeout_secs: 30,
            log_level: "info".into(),
        }
    }
}

impl ConsoleConfig {
    /// Returns the base config directory: `~/.launchpad/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".launchpad"))
    }

    /// Returns the config file path: `~/.launchpad/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.launchpad/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures the base and log directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk (creating a default file if missing) and applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self =
                serde_json::from_str(&content).with_context(|| "Failed to parse config.json")?;
            info!("Loaded config from {}", path.display());
            Ok(config.normalized())
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to `~/.launchpad/config.json` (the token is excluded).
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply overrides from the environment. The lookup is injected so tests
    /// do not have to mutate process state.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.api_token = Some(token.trim().to_string());
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        *self = std::mem::take(self).normalized();
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_debounce(&self) -> Duration {
        Duration::from_millis(self.probe_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        if self.poll_interval_ms == 0 {
            warn!("poll_interval_ms of 0 is not allowed, using 2000");
            self.poll_interval_ms = 2_000;
        }
        if self.max_consecutive_poll_failures == Some(0) {
            self.max_consecutive_poll_failures = None;
        }
        self
    }
}
