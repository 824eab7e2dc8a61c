/*!
 * Build report model and its JSON persistence.
 *
 * Every build leaves one `build_<id>.json` behind, fatal aborts included.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, DiagnosticSummary};
use crate::file_utils::FileManager;

/// Turn a build id into a single path component.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; anything else becomes `_`.
/// Ids made only of dots, or empty ones, are mapped to underscores.
pub fn sanitize_build_id(build_id: &str) -> String {
    let sanitized: String = build_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else if sanitized.chars().all(|c| c == '.') {
        sanitized.replace('.', "_")
    } else {
        sanitized
    }
}

/// Final status of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failed,
}

impl BuildStatus {
    /// Success only when nothing fatal or erroneous was reported
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.iter().any(Diagnostic::is_failure) {
            BuildStatus::Failed
        } else {
            BuildStatus::Success
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Success => "success",
            BuildStatus::Failed => "failed",
        }
    }
}

/// Digest of one source file read by the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    /// Path relative to the project root
    pub path: PathBuf,
    pub sha256: String,
}

/// Outcome of one build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub build_id: String,
    pub project_id: String,
    pub status: BuildStatus,
    /// Every diagnostic of every stage, in stage order
    pub errors: Vec<Diagnostic>,
    pub summary: DiagnosticSummary,
    /// RFC 3339 timestamp of report creation
    pub generated_at: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub output_files: Vec<PathBuf>,
    #[serde(default)]
    pub sources: Vec<SourceFingerprint>,
    /// Where the report was persisted; not part of the JSON
    #[serde(skip)]
    pub report_path: Option<PathBuf>,
}

impl BuildReport {
    /// Assemble a report, deriving status and summary from the diagnostics
    pub fn new(build_id: &str, project_id: &str, diagnostics: Vec<Diagnostic>, duration_ms: u64) -> Self {
        Self {
            build_id: build_id.to_string(),
            project_id: project_id.to_string(),
            status: BuildStatus::from_diagnostics(&diagnostics),
            summary: DiagnosticSummary::from_diagnostics(&diagnostics),
            errors: diagnostics,
            generated_at: chrono::Utc::now().to_rfc3339(),
            duration_ms,
            output_files: Vec::new(),
            sources: Vec::new(),
            report_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }

    /// Diagnostics with a given code
    pub fn diagnostics_with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.errors.iter().filter(move |d| d.code == code)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.errors.iter().any(|d| d.code == code)
    }

    /// Get a summary of the build
    pub fn summary_line(&self) -> String {
        format!(
            "Build {} [{}]: {} | {} file(s) | {} ms",
            self.build_id,
            self.status.as_str(),
            self.summary.summary(),
            self.output_files.len(),
            self.duration_ms
        )
    }
}

/// Persists build reports as pretty JSON
#[derive(Debug, Clone)]
pub struct BuildReportWriter {
    directory: PathBuf,
}

impl BuildReportWriter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn report_path(&self, build_id: &str) -> PathBuf {
        self.directory.join(format!("build_{}.json", sanitize_build_id(build_id)))
    }

    /// Write the report, creating the directory when absent
    pub fn write(&self, report: &BuildReport) -> Result<PathBuf> {
        FileManager::ensure_dir(&self.directory)?;
        let path = self.report_path(&report.build_id);
        let json = serde_json::to_string_pretty(report)
            .context("Failed to serialize build report")?;
        FileManager::write_to_file(&path, &json)?;
        Ok(path)
    }

    /// Read a report written earlier
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BuildReport> {
        let text = FileManager::read_to_string(&path)?;
        let mut report: BuildReport = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse build report: {:?}", path.as_ref()))?;
        report.report_path = Some(path.as_ref().to_path_buf());
        Ok(report)
    }
}
