//! Configuration loading and typed config structures for the Realm
//! simulation.
//!
//! The canonical configuration lives in `realm-config.yaml` at the project
//! root. Every section and field has a default, so an empty file is a
//! valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {variable}: {value}")]
    InvalidOverride {
        /// The environment variable.
        variable: &'static str,
        /// The value it held.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Realm configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RealmConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Where content files live.
    #[serde(default)]
    pub content: ContentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RealmConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `REALM_TICK_INTERVAL_MS` overrides `world.tick_interval_ms`
    /// - `REALM_CONTENT_DIR` overrides `content.dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for an unparsable override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `REALM_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = lookup("REALM_TICK_INTERVAL_MS") {
            self.world.tick_interval_ms = val
                .trim()
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidOverride {
                    variable: "REALM_TICK_INTERVAL_MS",
                    value: val.clone(),
                })?;
        }
        if let Some(val) = lookup("REALM_CONTENT_DIR") {
            self.content.dir = PathBuf::from(val);
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable world name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Milliseconds per tick, both real and simulated.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Area new players spawn in.
    #[serde(default = "default_start_area")]
    pub start_area: String,

    /// Link in the start area where new players appear.
    #[serde(default = "default_start_link")]
    pub start_link: String,

    /// Entity type used for player characters.
    #[serde(default = "default_player_type")]
    pub player_type: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            tick_interval_ms: default_tick_interval_ms(),
            start_area: default_start_area(),
            start_link: default_start_link(),
            player_type: default_player_type(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the simulation ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Content file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentConfig {
    /// Directory the content files are resolved against.
    #[serde(default = "default_content_dir")]
    pub dir: PathBuf,

    /// Entity template file.
    #[serde(default = "default_entities_file")]
    pub entities_file: String,

    /// Area definition file.
    #[serde(default = "default_areas_file")]
    pub areas_file: String,

    /// Story (messages and quests) file.
    #[serde(default = "default_story_file")]
    pub story_file: String,
}

impl ContentConfig {
    /// Full path of the entity template file.
    pub fn entities_path(&self) -> PathBuf {
        self.dir.join(&self.entities_file)
    }

    /// Full path of the area definition file.
    pub fn areas_path(&self) -> PathBuf {
        self.dir.join(&self.areas_file)
    }

    /// Full path of the story file.
    pub fn story_path(&self) -> PathBuf {
        self.dir.join(&self.story_file)
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            entities_file: default_entities_file(),
            areas_file: default_areas_file(),
            story_file: default_story_file(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_world_name() -> String {
    String::from("Realm")
}

const fn default_tick_interval_ms() -> u64 {
    100
}

fn default_start_area() -> String {
    String::from("start")
}

fn default_start_link() -> String {
    String::from("enter_start")
}

fn default_player_type() -> String {
    String::from("player")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("realm-content")
}

fn default_entities_file() -> String {
    String::from("entities.yaml")
}

fn default_areas_file() -> String {
    String::from("areas.yaml")
}

fn default_story_file() -> String {
    String::from("story.yaml")
}

fn default_log_level() -> String {
    String::from("info")
}
