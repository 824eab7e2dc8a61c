use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles the translator configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Project root holding `src/**/*.jpe`
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Where build reports go; falls back to the user data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_directory: Option<PathBuf>,

    /// XML generation settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Plugin discovery settings
    #[serde(default)]
    pub plugins: PluginConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the core XML generator
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Prepended to every generated file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file_prefix: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            output_file_prefix: None,
        }
    }
}

/// Settings for built-in plugin registration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PluginConfig {
    /// Whether the built-in plugins are registered at all
    #[serde(default = "default_true")]
    pub enable_builtin: bool,

    /// Names of built-in plugins to skip
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enable_builtin: true,
            disabled: Vec::new(),
        }
    }
}

impl PluginConfig {
    // @checks: Whether a built-in plugin should be registered
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enable_builtin && !self.disabled.iter().any(|d| d == name)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_indent_size() -> usize {
    4
}

fn default_true() -> bool {
    true
}

// Deeper indentation only bloats the output
const MAX_INDENT_SIZE: usize = 16;

impl Config {
    /// Create a configuration for one project root
    pub fn for_project<P: AsRef<Path>>(project_root: P) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Load the configuration file, or the defaults when there is none
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if FileManager::file_exists(path) => {
                let config = Self::load(path)?;
                Ok(config)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Load and parse one configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        FileManager::write_to_file(path, &json)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "project_root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if let Some(dir) = &self.reports_directory {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "reports_directory".to_string(),
                    reason: "must not be empty when set".to_string(),
                });
            }
        }

        if self.generator.indent_size > MAX_INDENT_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "generator.indent_size".to_string(),
                reason: format!("must be at most {}", MAX_INDENT_SIZE),
            });
        }

        if let Some(prefix) = &self.generator.output_file_prefix {
            if prefix.contains('/') || prefix.contains('\\') {
                return Err(ConfigError::InvalidValue {
                    field: "generator.output_file_prefix".to_string(),
                    reason: "must not contain path separators".to_string(),
                });
            }
        }

        if self.plugins.disabled.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "plugins.disabled".to_string(),
                reason: "plugin names must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Reports directory in effect.
    ///
    /// Uses the configured one, else `<data dir>/jpe-translator/reports`,
    /// else `<project_root>/reports` when no data dir exists.
    pub fn resolved_reports_directory(&self) -> PathBuf {
        if let Some(dir) = &self.reports_directory {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("jpe-translator").join("reports"))
            .unwrap_or_else(|| self.project_root.join("reports"))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            project_root: default_project_root(),
            reports_directory: None,
            generator: GeneratorConfig::default(),
            plugins: PluginConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
