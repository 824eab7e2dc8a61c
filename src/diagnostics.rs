/*!
 * Diagnostics shared by every pipeline stage.
 *
 * A diagnostic is a coded finding with a severity. Stages return lists of
 * them; the engine concatenates the lists and derives the build status.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable diagnostic codes
pub mod codes {
    // Project / loading
    pub const NO_JPE_FILES: &str = "NO_JPE_FILES";
    pub const PROJECT_ROOT_NOT_FOUND: &str = "PROJECT_ROOT_NOT_FOUND";
    pub const SOURCE_READ_FAILED: &str = "SOURCE_READ_FAILED";
    pub const BUILD_CANCELLED: &str = "BUILD_CANCELLED";
    pub const INVALID_BUILD_ID: &str = "INVALID_BUILD_ID";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

    // Parser
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const UNKNOWN_SECTION: &str = "UNKNOWN_SECTION";
    pub const UNEXPECTED_CONTENT: &str = "UNEXPECTED_CONTENT";
    pub const MALFORMED_LINE: &str = "MALFORMED_LINE";
    pub const UNKNOWN_KEY: &str = "UNKNOWN_KEY";
    pub const INVALID_VALUE: &str = "INVALID_VALUE";
    pub const DUPLICATE_PROJECT_SECTION: &str = "DUPLICATE_PROJECT_SECTION";
    pub const UNDEFINED_TEST_SET_REFERENCE: &str = "UNDEFINED_TEST_SET_REFERENCE";
    pub const UNDEFINED_LOOT_ACTION_REFERENCE: &str = "UNDEFINED_LOOT_ACTION_REFERENCE";

    // Validator
    pub const INVALID_PROJECT_NAME: &str = "INVALID_PROJECT_NAME";
    pub const INVALID_PROJECT_ID: &str = "INVALID_PROJECT_ID";
    pub const INVALID_INTERACTION_ID: &str = "INVALID_INTERACTION_ID";
    pub const INVALID_BUFF_ID: &str = "INVALID_BUFF_ID";
    pub const INVALID_TRAIT_ID: &str = "INVALID_TRAIT_ID";
    pub const INVALID_ENUM_ID: &str = "INVALID_ENUM_ID";
    pub const INVALID_TEST_SET_ID: &str = "INVALID_TEST_SET_ID";
    pub const INVALID_TEST_CONDITION: &str = "INVALID_TEST_CONDITION";
    pub const DUPLICATE_PARTICIPANT_ROLES: &str = "DUPLICATE_PARTICIPANT_ROLES";
    pub const INVALID_BUFF_DURATION: &str = "INVALID_BUFF_DURATION";
    pub const DUPLICATE_ENUM_OPTIONS: &str = "DUPLICATE_ENUM_OPTIONS";
    pub const EMPTY_ENUM_OPTIONS: &str = "EMPTY_ENUM_OPTIONS";
    pub const INVALID_STRING_KEY: &str = "INVALID_STRING_KEY";
    pub const EMPTY_STRING_TEXT: &str = "EMPTY_STRING_TEXT";
    pub const INVALID_LOCALE_FORMAT: &str = "INVALID_LOCALE_FORMAT";
    pub const DUPLICATE_STRING_KEY: &str = "DUPLICATE_STRING_KEY";
    pub const DUPLICATE_RESOURCE_ID: &str = "DUPLICATE_RESOURCE_ID";
    pub const UNDEFINED_BUFF_REFERENCE: &str = "UNDEFINED_BUFF_REFERENCE";
    pub const UNDEFINED_TRAIT_REFERENCE: &str = "UNDEFINED_TRAIT_REFERENCE";

    // Generator
    pub const OUTPUT_WRITE_FAILED: &str = "OUTPUT_WRITE_FAILED";
    pub const XML_ENCODING_FAILED: &str = "XML_ENCODING_FAILED";

    // Plugins
    pub const PLUGIN_LOADED: &str = "PLUGIN_LOADED";
    pub const PLUGIN_FAILED: &str = "PLUGIN_FAILED";
}

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Aborts the remaining pipeline
    Fatal,
    /// Fails the build, collection continues
    Error,
    /// Reported only
    Warning,
    /// Advisory notice
    Info,
}

impl Severity {
    /// Whether this severity fails a build
    pub fn is_failure(&self) -> bool {
        matches!(self, Severity::Fatal | Severity::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which part of the pipeline produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Project,
    Parse,
    Validation,
    Generation,
    Plugin,
    Internal,
}

/// A file/line position inside a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One coded finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub category: Category,
    pub severity: Severity,
    pub message_short: String,
    pub message_long: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity
    pub fn new(
        severity: Severity,
        category: Category,
        code: &str,
        message_short: impl Into<String>,
        message_long: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            category,
            severity,
            message_short: message_short.into(),
            message_long: message_long.into(),
            suggested_fix: None,
            resource_id: None,
            location: None,
        }
    }

    pub fn fatal(
        category: Category,
        code: &str,
        message_short: impl Into<String>,
        message_long: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Fatal, category, code, message_short, message_long)
    }

    pub fn error(
        category: Category,
        code: &str,
        message_short: impl Into<String>,
        message_long: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, category, code, message_short, message_long)
    }

    pub fn warning(
        category: Category,
        code: &str,
        message_short: impl Into<String>,
        message_long: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, category, code, message_short, message_long)
    }

    pub fn info(
        category: Category,
        code: &str,
        message_short: impl Into<String>,
        message_long: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, category, code, message_short, message_long)
    }

    /// Attach a suggested fix
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// Attach the name of the resource concerned
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Attach a source position
    pub fn at(mut self, file: &Path, line: usize) -> Self {
        self.location = Some(SourceLocation {
            file: file.display().to_string(),
            line,
        });
        self
    }

    pub fn is_failure(&self) -> bool {
        self.severity.is_failure()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message_short)?;
        if let Some(ref resource) = self.resource_id {
            write!(f, " ({})", resource)?;
        }
        if let Some(ref location) = self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

/// Diagnostic counts by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    pub fatal: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

impl DiagnosticSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Fatal => summary.fatal += 1,
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    /// Number of diagnostics that fail a build
    pub fn failures(&self) -> usize {
        self.fatal + self.errors
    }

    pub fn summary(&self) -> String {
        format!(
            "{} fatal, {} errors, {} warnings, {} info",
            self.fatal, self.errors, self.warnings, self.info
        )
    }
}

/// True when any diagnostic is fatal
pub fn has_fatal(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_fatal)
}
