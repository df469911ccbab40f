use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::request::DEFAULT_DESTINATION;

pub const CONFIG_ENV: &str = "NAVIGATE_CONFIG";
const CONFIG_FILE: &str = "navigate.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read navigator config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigatorConfig {
    /// Overrides `<meta name="base-url">` when set.
    pub base_url: Option<String>,
    pub default_destination: String,
    pub request_timeout_secs: u64,
    /// Lifetime of an error banner: visible period plus slide-up.
    pub banner_ttl_ms: u64,
    pub reload_button: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_destination: DEFAULT_DESTINATION.to_string(),
            request_timeout_secs: 300,
            banner_ttl_ms: 5_500,
            reload_button: true,
        }
    }
}

impl NavigatorConfig {
    /// Load from a YAML file. A missing path or file yields the defaults.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Ok(serde_yaml::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Load from `$NAVIGATE_CONFIG`, falling back to the user config directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path);
        Self::load(path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_millis(self.banner_ttl_ms)
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "navigate", "navigate")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
