/*!
 * Error types for the jpe-translator application.
 *
 * Expected build problems are reported as diagnostics, never as errors.
 * The types here cover the Rust-level seams: configuration loading,
 * plugin invocation and XML serialization.
 */

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for `Config`
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration value is out of range or inconsistent
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Errors a plugin may return, or that the manager raises on its behalf
#[derive(Error, Debug)]
pub enum PluginError {
    /// The plugin reported a failure
    #[error("Plugin '{plugin}' failed: {message}")]
    Failed { plugin: String, message: String },

    /// The plugin panicked while running
    #[error("Plugin '{plugin}' panicked: {message}")]
    Panicked { plugin: String, message: String },

    /// A plugin with the same name is already registered for this capability
    #[error("Plugin '{0}' is already registered")]
    Duplicate(String),

    /// File access failed inside a plugin
    #[error("Plugin I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A plugin could not decode its input
    #[error("Plugin parse error: {0}")]
    Parse(String),
}

impl PluginError {
    /// Convenience constructor for plugin implementations
    pub fn failed(plugin: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while serializing tuning XML
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Writing the document failed
    #[error("I/O error while writing XML: {0}")]
    Io(#[from] std::io::Error),

    /// quick-xml rejected an event
    #[error("XML serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The serialized buffer was not valid UTF-8
    #[error("XML output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration handling
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a plugin
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// Error from XML generation
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Text of a caught panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
