//! Engine configuration, read from `OLIVIA_*` environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::locale;

/// Output format of the logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Root of the resource directory (intents, messages, trained models).
    pub res_dir: PathBuf,
    /// Locales loaded at startup.
    #[validate(length(min = 1))]
    pub locales: Vec<String>,
    /// Locale used when a request names an unsupported one.
    #[validate(length(min = 1))]
    pub default_locale: String,
    #[validate(range(min = 0.0001, max = 10.0))]
    pub learning_rate: f64,
    /// Node count of each hidden layer.
    #[validate(length(min = 1))]
    pub hidden_layers: Vec<usize>,
    #[validate(range(min = 1))]
    pub training_iterations: usize,
    #[validate(range(min = 1))]
    pub cache_ttl_secs: u64,
    /// Entry bound of each cache and of the profile store.
    #[validate(range(min = 1))]
    pub cache_capacity: usize,
    #[validate(range(min = 1))]
    pub max_utterance_chars: usize,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            res_dir: PathBuf::from("res"),
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
            learning_rate: 0.1,
            hidden_layers: vec![50],
            training_iterations: 200,
            cache_ttl_secs: 300,
            cache_capacity: 10_000,
            max_utterance_chars: 500,
            log_format: LogFormat::Pretty,
        }
    }
}

fn var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{}={}: {}", key, value, e))),
        _ => Ok(default),
    }
}

fn list<T>(key: &str, default: Vec<T>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse()
                    .map_err(|e| AppError::Config(format!("{}={}: {}", key, value, e)))
            })
            .collect(),
        _ => Ok(default),
    }
}

impl EngineConfig {
    /// Reads the configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            res_dir: var("OLIVIA_RES_DIR", defaults.res_dir)?,
            locales: list("OLIVIA_LOCALES", defaults.locales)?,
            default_locale: var("OLIVIA_DEFAULT_LOCALE", defaults.default_locale)?,
            learning_rate: var("OLIVIA_LEARNING_RATE", defaults.learning_rate)?,
            hidden_layers: list("OLIVIA_HIDDEN_LAYERS", defaults.hidden_layers)?,
            training_iterations: var("OLIVIA_TRAINING_ITERATIONS", defaults.training_iterations)?,
            cache_ttl_secs: var("OLIVIA_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            cache_capacity: var("OLIVIA_CACHE_CAPACITY", defaults.cache_capacity)?,
            max_utterance_chars: var("OLIVIA_MAX_UTTERANCE_CHARS", defaults.max_utterance_chars)?,
            log_format: var("OLIVIA_LOG_FORMAT", defaults.log_format)?,
        };
        config.check()?;
        Ok(config)
    }

    /// Validates field ranges and the relation between locales.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if !self.locales.contains(&self.default_locale) {
            return Err(AppError::Config(format!(
                "default locale '{}' is not one of the loaded locales {:?}",
                self.default_locale, self.locales
            )));
        }
        if self.hidden_layers.contains(&0) {
            return Err(AppError::Config("hidden layers need at least one node".into()));
        }
        for tag in &self.locales {
            if !locale::exists(tag) {
                warn!("Locale '{}' is not supported, English stemming will be used", tag);
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
