//! TOML Configuration File Support
//!
//! Configuration for the container geometry a host supports and for how the
//! manager treats failing click handlers. Read from
//! `$XDG_CONFIG_HOME/gridui/gridui.toml` by default.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [container]
//! max_slots = 54
//! columns = 9
//!
//! [dispatch]
//! catch_panics = true
//! report_failures = true
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::DEFAULT_COLUMNS;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Largest container the host can show
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLimits {
    /// Total cells of the biggest container (a double chest has 54)
    pub max_slots: usize,
    /// Cells per row
    pub columns: usize,
}

impl Default for ContainerLimits {
    fn default() -> Self {
        Self {
            max_slots: 54,
            columns: DEFAULT_COLUMNS,
        }
    }
}

/// How the manager treats failing click handlers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Catch panics raised by handlers and callbacks
    pub catch_panics: bool,
    /// Forward failures to `ContainerHost::report_click_failure`
    pub report_failures: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            report_failures: true,
        }
    }
}

/// Complete configuration
#[derive(Clone, Debug, Default)]
pub struct GridUiConfig {
    /// Container geometry
    pub container: ContainerLimits,
    /// Dispatch behaviour
    pub dispatch: DispatchConfig,
    /// File the configuration was read from, if any
    pub config_file_path: Option<PathBuf>,
    source: Option<ConfigSource>,
}

impl GridUiConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source.unwrap_or(ConfigSource::Default)
    }

    /// Check invariants between values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] when the geometry is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ContainerLimits { max_slots, columns } = self.container;
        if columns == 0 {
            return Err(ConfigError::ValidationError(
                "container.columns must be greater than zero".to_string(),
            ));
        }
        if max_slots < columns {
            return Err(ConfigError::ValidationError(format!(
                "container.max_slots ({max_slots}) must hold at least one row of {columns}"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Container section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerToml {
    /// Total cells of the biggest container
    pub max_slots: Option<usize>,
    /// Cells per row
    pub columns: Option<usize>,
}

/// Dispatch section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchToml {
    /// Catch panics raised by handlers
    pub catch_panics: Option<bool>,
    /// Report failures to the host
    pub report_failures: Option<bool>,
}

/// Root of the TOML configuration file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GridUiToml {
    /// `[container]` section
    pub container: ContainerToml,
    /// `[dispatch]` section
    pub dispatch: DispatchToml,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/gridui/gridui.toml` or
/// `~/.config/gridui/gridui.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("gridui").join("gridui.toml"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<GridUiConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<GridUiConfig, ConfigError> {
    let mut config = GridUiConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: GridUiToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = Some(ConfigSource::File);

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut GridUiConfig, toml: &GridUiToml) {
    if let Some(max_slots) = toml.container.max_slots {
        config.container.max_slots = max_slots;
    }
    if let Some(columns) = toml.container.columns {
        config.container.columns = columns;
    }
    if let Some(catch) = toml.dispatch.catch_panics {
        config.dispatch.catch_panics = catch;
    }
    if let Some(report) = toml.dispatch.report_failures {
        config.dispatch.report_failures = report;
    }
}

/// Apply `GRIDUI_*` overrides read through `lookup`
fn apply_env_config<F>(config: &mut GridUiConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(max_slots) = lookup("GRIDUI_MAX_SLOTS").and_then(|v| v.parse::<usize>().ok()) {
        config.container.max_slots = max_slots;
        config.source = Some(ConfigSource::Env);
    }
    if let Some(columns) = lookup("GRIDUI_COLUMNS").and_then(|v| v.parse::<usize>().ok()) {
        config.container.columns = columns;
        config.source = Some(ConfigSource::Env);
    }
    if let Some(catch) = lookup("GRIDUI_CATCH_PANICS") {
        config.dispatch.catch_panics = catch != "0" && catch.to_lowercase() != "false";
        config.source = Some(ConfigSource::Env);
    }
}
