use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

pub const SESSION_KEY: &str = "skyview.session";

const DEFAULT_MEASUREMENT_TIMEOUT: Duration = Duration::from_millis(3500);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub measurement_timeout_secs: f64,
    /// Exponential damping rate of the displayed cut offset, per second.
    pub cut_damping: f64,
    /// Explode displacement as a fraction of the scene radius.
    pub explode_factor: f64,
    pub explode_rate: f64,
    pub session_key: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            measurement_timeout_secs: 3.5,
            cut_damping: 10.0,
            explode_factor: 0.6,
            explode_rate: 6.0,
            session_key: SESSION_KEY.to_string(),
        }
    }
}

impl StudioConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| StudioError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("measurement_timeout_secs", self.measurement_timeout_secs),
            ("cut_damping", self.cut_damping),
            ("explode_rate", self.explode_rate),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(StudioError::Config(format!("{name} must be > 0")));
            }
        }
        if !self.explode_factor.is_finite() || self.explode_factor < 0.0 {
            return Err(StudioError::Config("explode_factor must be >= 0".to_string()));
        }
        if self.session_key.trim().is_empty() {
            return Err(StudioError::Config("session_key must not be empty".to_string()));
        }
        Ok(())
    }

    /// Falls back to the default timeout when the configured one is not a
    /// representable positive duration.
    pub fn measurement_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.measurement_timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_MEASUREMENT_TIMEOUT)
    }

    /// Replaces out-of-range fields with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 { value } else { fallback }
        };
        Self {
            measurement_timeout_secs: positive(
                self.measurement_timeout_secs,
                defaults.measurement_timeout_secs,
            ),
            cut_damping: positive(self.cut_damping, defaults.cut_damping),
            explode_factor: if self.explode_factor.is_finite() && self.explode_factor >= 0.0 {
                self.explode_factor
            } else {
                defaults.explode_factor
            },
            explode_rate: positive(self.explode_rate, defaults.explode_rate),
            session_key: if self.session_key.trim().is_empty() {
                defaults.session_key
            } else {
                self.session_key
            },
        }
    }
}
