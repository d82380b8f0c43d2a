use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "PORTFOLIO";
pub const DEFAULT_CONFIG_FILE: &str = "portfolio-messages.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 10,
            },
            storage: StorageSettings {
                path: PathBuf::from("./portfolio-messages-state"),
            },
            catalog: CatalogSettings { ttl_secs: 60 * 60 },
        }
    }
}

impl Settings {
    /// Layers built-in defaults, an optional TOML file, `.env` and
    /// `PORTFOLIO__SECTION__KEY` environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        Self::build(path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE)), env)
    }

    fn build(path: &Path, env: Environment) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        debug!("Loading settings from {}", path.display());

        let settings: Settings = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("storage.path", defaults.storage.path.to_string_lossy().to_string())?
            .set_default("catalog.ttl_secs", defaults.catalog.ttl_secs)?
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings
            .validate()
            .map_err(|errors| SettingsError::Invalid(errors.join(", ")))?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.api.base_url.trim().is_empty() {
            errors.push("api.base_url must not be empty".to_string());
        } else if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            errors.push("api.base_url must start with http:// or https://".to_string());
        }
        if self.api.timeout_secs == 0 {
            errors.push("api.timeout_secs must be > 0".to_string());
        }
        if self.catalog.ttl_secs == 0 {
            errors.push("catalog.ttl_secs must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog.ttl_secs)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
