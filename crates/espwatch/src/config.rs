//! Application configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. TOML file
//! 3. `ESPWATCH__`-prefixed environment variables, e.g. `ESPWATCH__RELAY__PORT=8080`
//!
//! Command-line flags are applied on top by the caller.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use espwatch_relay::RelayConfig;
use espwatch_viewer::ViewerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ESPWATCH_CONFIG";
/// Config file used when neither `--config` nor `ESPWATCH_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

const ENV_PREFIX: &str = "ESPWATCH";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl AppConfig {
    /// Load from `path` (if given, it must exist) or the default path (optional),
    /// then apply environment overrides.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };
        Self::load_from(path, required, environment())
    }

    /// Load with an explicit environment source.
    pub fn load_from(path: &str, required: bool, env: Environment) -> AppResult<Self> {
        if required && !Path::new(path).exists() {
            return Err(AppError::Config(format!("Config file not found: {path}")));
        }

        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(required))
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse a TOML document, without environment overrides.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to render config: {e}")))
    }
}

/// Environment source reading `ESPWATCH__SECTION__KEY` variables.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
