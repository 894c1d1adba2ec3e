use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::session::DEFAULT_FALLBACK_MESSAGE;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/chat";
pub const ENDPOINT_ENV: &str = "ALFRED_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub fallback_message: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; each one beats the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved settings the app runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub fallback_message: String,
    pub request_timeout: Option<Duration>,
    pub log_file: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location; a missing file means defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Merge CLI overrides, the environment endpoint and this file into the
    /// settings the app uses. Precedence: CLI, env, file, built-in default.
    pub fn resolve(&self, overrides: &Overrides, env_endpoint: Option<String>) -> Result<Settings> {
        let endpoint = overrides
            .endpoint
            .clone()
            .or(env_endpoint)
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let request_timeout = overrides
            .request_timeout_secs
            .or(self.request_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let log_file = match overrides.log_file.clone().or_else(|| self.log_file.clone()) {
            Some(path) => path,
            None => Self::default_log_path()?,
        };

        Ok(Settings {
            endpoint,
            fallback_message: self
                .fallback_message
                .clone()
                .unwrap_or_else(|| DEFAULT_FALLBACK_MESSAGE.to_string()),
            request_timeout,
            log_file,
        })
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("alfred-chat").join("config.json"))
    }

    fn default_log_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .or_else(dirs::config_dir)
            .ok_or_else(|| anyhow!("Could not determine a directory for the log file"))?;

        Ok(cache_dir.join("alfred-chat").join("alfred.log"))
    }
}
