use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MODELS_DIR: &str = "generated_models";

/// Endpoints and output locations for the generation pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Studio backend exposing `POST /generate`.
    pub api_url: String,
    pub wing_generator_api: Option<String>,
    pub timeout_secs: u64,
    pub dreamfusion_api: Option<String>,
    /// Base of the URLs handed out for locally written models.
    pub public_base_url: String,
    pub models_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            wing_generator_api: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dreamfusion_api: None,
            public_base_url: DEFAULT_API_URL.to_string(),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();
        if let Some(url) = get("SKYVIEW_API_URL") {
            config.api_url = url;
        }
        config.wing_generator_api = get("WING_GENERATOR_API");
        if let Some(timeout) = get("WING_GENERATOR_TIMEOUT") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                GenerateError::Config(format!(
                    "WING_GENERATOR_TIMEOUT must be whole seconds, got {timeout:?}"
                ))
            })?;
        }
        config.dreamfusion_api = get("DREAMFUSION_API");
        if let Some(url) = get("PUBLIC_BASE_URL") {
            config.public_base_url = url;
        }
        if let Some(dir) = get("GENERATED_MODELS_DIR") {
            config.models_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
