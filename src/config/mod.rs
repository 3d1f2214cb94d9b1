mod api;
mod auth;
mod defaults;
mod validation;

use crate::api::TransportFactory;
use crate::cli::Args;
use crate::error::{ChatError, Result as ChatResult};
use crate::models::Location;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use validation::{expand_with, validate_base_url};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "defaults::default_accuracy")]
    pub accuracy: f64,
}

pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub stream_timeout: u64,
    pub context_limit: usize,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> ChatResult<Self> {
        let json_config = JsonConfig::load().map_err(|e| ChatError::ConfigError(format!("{:#}", e)))?;
        Self::resolve(args, &json_config, |name| env::var(name).ok())
    }

    /// Merge sources: CLI args > environment > config file > defaults.
    pub fn resolve<F>(args: &Args, json_config: &JsonConfig, env_lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = args
            .api_url
            .clone()
            .or_else(|| env_lookup("STREAMCHAT_API_URL"))
            .or(json_config.api.base_url.clone())
            .ok_or_else(|| {
                ChatError::ConfigError(
                    "no API base URL; set STREAMCHAT_API_URL, --api-url, or api.base_url".to_string(),
                )
            })?;
        let api_url = validate_base_url(&api_url).map_err(ChatError::ConfigError)?;

        // Token: env var > JSON config (with ${VAR} expansion)
        let token = env_lookup("STREAMCHAT_TOKEN")
            .or_else(|| {
                json_config
                    .auth
                    .token
                    .as_deref()
                    .map(|t| expand_with(t, &env_lookup))
            })
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && !t.contains("${"));

        let stream_timeout = match args.stream_timeout {
            Some(secs) => secs,
            None => match env_lookup("STREAMCHAT_STREAM_TIMEOUT") {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    ChatError::ConfigError(format!("invalid STREAMCHAT_STREAM_TIMEOUT: {}", raw))
                })?,
                None => json_config
                    .api
                    .stream_timeout
                    .unwrap_or_else(defaults::default_stream_timeout),
            },
        }
        .max(1);

        let context_limit = json_config
            .api
            .context_limit
            .unwrap_or_else(defaults::default_context_limit)
            .max(1);

        let location = match args
            .location
            .clone()
            .or_else(|| env_lookup("STREAMCHAT_LOCATION"))
        {
            Some(raw) => Some(raw.parse::<Location>()?),
            None => match &json_config.location {
                Some(loc) => Some(Location::new(loc.latitude, loc.longitude, loc.accuracy)?),
                None => None,
            },
        };

        Ok(Config {
            api_url,
            token,
            stream_timeout,
            context_limit,
            location,
        })
    }

    pub fn transport_factory(&self) -> TransportFactory {
        TransportFactory::new(&self.api_url).with_context_limit(self.context_limit)
    }
}

impl JsonConfig {
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // No config file found, return default
        Ok(JsonConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: JsonConfig = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Current directory (highest priority - local override)
        paths.push(PathBuf::from(".streamchat.yaml"));
        paths.push(PathBuf::from(".streamchat.yml"));
        paths.push(PathBuf::from(".streamchat.json"));

        // 2. User's config directory (global config)
        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("streamchat");
            paths.push(config_dir.join("streamchat.yaml"));
            paths.push(config_dir.join("streamchat.yml"));
            paths.push(config_dir.join("streamchat.json"));
        }

        paths
    }
}
