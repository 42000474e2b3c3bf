//! Configuration management for arize

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{API_KEY_ENV_VAR, DEFAULT_URI, SPACE_KEY_ENV_VAR, URI_ENV_VAR};
use crate::error::{ArizeError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credentials and endpoint
    #[serde(default)]
    pub client: ClientConfig,

    /// Network settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Credentials and endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key, `ARIZE_API_KEY` takes precedence
    pub api_key: Option<String>,
    /// Space key, `ARIZE_SPACE_KEY` takes precedence
    pub space_key: Option<String>,
    /// Base URI, `ARIZE_URI` takes precedence
    pub uri: Option<String>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// HTTP timeout in seconds, 0 disables it
    pub timeout: u64,
    /// Use proxy
    pub proxy: Option<String>,
    /// Verify TLS certificates
    pub verify: bool,
    /// Ask the server to ingest synchronously
    pub sync: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 60,
            proxy: None,
            verify: true,
            sync: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ArizeError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("arize").join("config.toml"))
    }

    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file, defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ArizeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset() -> Result<()> {
        Self::reset_at(&Self::config_path()?)
    }

    /// Reset the configuration file at `path` to defaults
    pub fn reset_at(path: &Path) -> Result<()> {
        Self::default().save_to(path)
    }

    /// Initialize configuration file
    pub fn init(force: bool) -> Result<()> {
        Self::init_at(&Self::config_path()?, force)
    }

    /// Initialize the configuration file at `path`
    pub fn init_at(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(ArizeError::Config(
                "Configuration file already exists. Use --force to overwrite.".into(),
            ));
        }

        Self::default().save_to(path)
    }

    /// Effective API key
    pub fn api_key(&self) -> Option<String> {
        env_non_empty(API_KEY_ENV_VAR).or_else(|| self.client.api_key.clone())
    }

    /// Effective space key
    pub fn space_key(&self) -> Option<String> {
        env_non_empty(SPACE_KEY_ENV_VAR).or_else(|| self.client.space_key.clone())
    }

    /// Effective base URI
    pub fn uri(&self) -> String {
        env_non_empty(URI_ENV_VAR)
            .or_else(|| self.client.uri.clone())
            .unwrap_or_else(|| DEFAULT_URI.to_string())
    }

    /// HTTP client honoring proxy and TLS settings
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(format!("{}/{}", crate::NAME, crate::VERSION))
            .gzip(true)
            .danger_accept_invalid_certs(!self.network.verify);
        if self.network.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(self.network.timeout));
        }
        if let Some(ref proxy) = self.network.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "client.api_key" => self.client.api_key.clone(),
            "client.space_key" => self.client.space_key.clone(),
            "client.uri" => self.client.uri.clone(),

            "network.timeout" => Some(self.network.timeout.to_string()),
            "network.proxy" => self.network.proxy.clone(),
            "network.verify" => Some(self.network.verify.to_string()),
            "network.sync" => Some(self.network.sync.to_string()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = |value: &str| {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        match key {
            "client.api_key" => self.client.api_key = optional(value),
            "client.space_key" => self.client.space_key = optional(value),
            "client.uri" => self.client.uri = optional(value),

            "network.timeout" => {
                self.network.timeout = value.parse().map_err(|_| {
                    ArizeError::Config("Invalid number for timeout".into())
                })?;
            }
            "network.proxy" => self.network.proxy = optional(value),
            "network.verify" => {
                self.network.verify = value.parse().map_err(|_| {
                    ArizeError::Config("Invalid boolean for verify".into())
                })?;
            }
            "network.sync" => {
                self.network.sync = value.parse().map_err(|_| {
                    ArizeError::Config("Invalid boolean for sync".into())
                })?;
            }

            "logging.level" => self.logging.level = value.to_string(),
            "logging.color" => {
                self.logging.color = value.parse().map_err(|_| {
                    ArizeError::Config("Invalid boolean for color".into())
                })?;
            }

            _ => {
                return Err(ArizeError::Config(format!("Unknown configuration key: {}", key)));
            }
        }

        Ok(())
    }
}
