//! Configuration system
//!
//! Configuration types load from `.toml` or `.ron` files (or strings) through
//! the [`Config`] trait.

use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Largest capacity hint accepted by [`SchedulerConfig::validate`]
pub const MAX_CAPACITY_HINT: usize = 1 << 20;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension(path) {
            Some("toml") => Self::from_toml_str,
            Some("ron") => Self::from_ron_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        let contents = std::fs::read_to_string(path)?;
        parse(&contents)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its accepted range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning for a single scheduler instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Initial capacity reserved for the member list and ordered views
    pub capacity_hint: usize,
    /// Emit a `debug!` summary for every flush that changed membership
    pub log_flushes: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity_hint: 16,
            log_flushes: false,
        }
    }
}

impl SchedulerConfig {
    /// Reject values the scheduler cannot sensibly honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity_hint > MAX_CAPACITY_HINT {
            return Err(ConfigError::Invalid(format!(
                "capacity_hint {} exceeds {MAX_CAPACITY_HINT}",
                self.capacity_hint
            )));
        }
        Ok(())
    }
}

impl Config for SchedulerConfig {}

/// Top-level configuration for a world and its collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Name used in log output for the entity collection
    pub world_name: String,
    /// Optional `env_logger` filter applied by hosts at startup
    pub log_filter: Option<String>,
    /// Settings for the world's entity collection
    pub entities: SchedulerConfig,
    /// Settings for every entity's component collection
    pub components: SchedulerConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            world_name: "world".to_string(),
            log_filter: None,
            entities: SchedulerConfig::default(),
            components: SchedulerConfig {
                capacity_hint: 4,
                log_flushes: false,
            },
        }
    }
}

impl LifecycleConfig {
    /// Validate every nested section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_name.trim().is_empty() {
            return Err(ConfigError::Invalid("world_name must not be empty".to_string()));
        }
        self.entities.validate()?;
        self.components.validate()
    }
}

impl Config for LifecycleConfig {}
