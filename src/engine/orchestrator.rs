/*!
 * Build orchestrator driving one JPE project through the pipeline.
 *
 * Stages run in a fixed order:
 * 1. Load sources: discover JPE files under `src/` and plugin-claimed files
 * 2. Parse: JPE parser, then parser plugins
 * 3. Transform: transform plugins, in name order
 * 4. Validate: semantic checks
 * 5. Generate: core XML, then generator plugins
 * 6. Report: always written, fatal aborts included
 *
 * A fatal diagnostic skips straight to the report. Errors do not stop the
 * pipeline; they only decide the final status.
 */

use log::{debug, error, info, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::diagnostics::{codes, has_fatal, Category, Diagnostic};
use crate::errors::panic_message;
use crate::file_utils::FileManager;
use crate::generator::XmlGenerator;
use crate::ir::ProjectIR;
use crate::parser::{JpeParser, SourceFile};
use crate::plugins::PluginManager;
use crate::validation::ProjectValidator;

use super::report::{sanitize_build_id, BuildReport, BuildReportWriter, BuildStatus, SourceFingerprint};

/// Stages of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Init,
    LoadSources,
    Parse,
    Transform,
    Validate,
    Generate,
    Report,
    Success,
    Failed,
}

impl BuildStage {
    /// 1-based position among the stages a full build goes through
    pub fn step(&self) -> usize {
        match self {
            BuildStage::Init => 1,
            BuildStage::LoadSources => 2,
            BuildStage::Parse => 3,
            BuildStage::Transform => 4,
            BuildStage::Validate => 5,
            BuildStage::Generate => 6,
            BuildStage::Report => 7,
            BuildStage::Success | BuildStage::Failed => 8,
        }
    }

    pub const TOTAL_STEPS: usize = 8;

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStage::Success | BuildStage::Failed)
    }
}

/// Progress information during a build
#[derive(Debug, Clone)]
pub struct BuildProgress {
    pub build_id: String,
    pub stage: BuildStage,
    /// Current status message
    pub message: String,
    /// Diagnostics collected so far
    pub diagnostics_so_far: usize,
}

impl BuildProgress {
    /// Overall progress (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        self.stage.step() as f32 / BuildStage::TOTAL_STEPS as f32
    }
}

/// Cooperative cancellation flag checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub type ProgressCallback = Box<dyn Fn(&BuildProgress) + Send + Sync>;

/// State accumulated by one build
#[derive(Default)]
struct BuildState {
    diagnostics: Vec<Diagnostic>,
    project_id: String,
    sources: Vec<SourceFingerprint>,
    output_files: Vec<PathBuf>,
}

/// Sources found under `src/`
struct LoadedSources {
    jpe: Vec<SourceFile>,
    plugin_files: Vec<PathBuf>,
}

/// The main build orchestrator
pub struct TranslationEngine {
    config: Config,
    plugins: Arc<PluginManager>,
    parser: JpeParser,
    validator: ProjectValidator,
    generator: XmlGenerator,
    progress_callback: Option<ProgressCallback>,
    cancellation: Option<CancellationToken>,
}

impl TranslationEngine {
    /// Create an engine for the project named in `config`
    pub fn new(config: Config, plugins: Arc<PluginManager>) -> Self {
        let generator = XmlGenerator::with_config(config.generator.clone());
        Self {
            config,
            plugins,
            parser: JpeParser::new(),
            validator: ProjectValidator::new(),
            generator,
            progress_callback: None,
            cancellation: None,
        }
    }

    /// Report stage transitions to a callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Stop at the next stage boundary once the token is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory the XML of a build goes to
    pub fn output_directory(&self, build_id: &str) -> PathBuf {
        self.config.project_root.join("build").join(sanitize_build_id(build_id))
    }

    /// Run a full build.
    ///
    /// Never fails: every problem, panics included, ends up in the
    /// returned report, which is also written to the reports directory.
    ///
    /// An id that is not a single safe path component is rejected with a
    /// fatal diagnostic; the report is then written under its sanitized form.
    pub fn build_from_jpe(&self, requested_id: &str) -> BuildReport {
        let start_time = Instant::now();
        let mut state = BuildState::default();
        let build_id = sanitize_build_id(requested_id);
        let build_id = build_id.as_str();
        info!("Starting build {} for {:?}", build_id, self.config.project_root);

        let run = if build_id == requested_id {
            catch_unwind(AssertUnwindSafe(|| self.run_stages(build_id, &mut state)))
        } else {
            warn!("Rejected build id {:?}", requested_id);
            state.diagnostics.push(
                Diagnostic::fatal(
                    Category::Project,
                    codes::INVALID_BUILD_ID,
                    "Invalid build id",
                    format!(
                        "The build id {:?} is not a plain directory name; nothing was built and the report was saved as '{}'.",
                        requested_id, build_id
                    ),
                )
                .with_fix("Use only letters, digits, '.', '-' and '_' in the build id"),
            );
            Ok(())
        };
        if let Err(payload) = run {
            let message = panic_message(payload.as_ref());
            error!("Build {} aborted by internal error: {}", build_id, message);
            state.diagnostics.push(
                Diagnostic::fatal(
                    Category::Internal,
                    codes::INTERNAL_ERROR,
                    "Internal error during build",
                    message,
                )
                .with_fix("Please report this problem together with the build report"),
            );
        }

        self.emit(build_id, BuildStage::Report, "Writing build report", &state);
        let mut report = BuildReport::new(
            build_id,
            &state.project_id,
            state.diagnostics,
            start_time.elapsed().as_millis() as u64,
        );
        report.output_files = state.output_files;
        report.sources = state.sources;

        let writer = BuildReportWriter::new(self.config.resolved_reports_directory());
        match writer.write(&report) {
            Ok(path) => {
                debug!("Build report written to {:?}", path);
                report.report_path = Some(path);
            }
            Err(e) => error!("Failed to write build report for {}: {:#}", build_id, e),
        }

        let final_stage = match report.status {
            BuildStatus::Success => BuildStage::Success,
            BuildStatus::Failed => BuildStage::Failed,
        };
        self.emit_with_count(build_id, final_stage, &report.summary_line(), report.errors.len());
        info!("{}", report.summary_line());

        report
    }

    /// Parse, transform and validate without writing anything
    pub fn validate_only(&self) -> Vec<Diagnostic> {
        let mut state = BuildState::default();

        let run = catch_unwind(AssertUnwindSafe(|| {
            if let Some(sources) = self.load_sources(&mut state) {
                let ir = self.parse_and_transform(sources, &mut state);
                if !has_fatal(&state.diagnostics) {
                    state.diagnostics.extend(self.validator.validate(&ir));
                }
            }
        }));
        if let Err(payload) = run {
            state.diagnostics.push(Diagnostic::fatal(
                Category::Internal,
                codes::INTERNAL_ERROR,
                "Internal error during validation",
                panic_message(payload.as_ref()),
            ));
        }

        state.diagnostics
    }

    fn run_stages(&self, build_id: &str, state: &mut BuildState) {
        self.emit(build_id, BuildStage::Init, "Initializing build", state);
        state.diagnostics.extend(self.plugins.loaded_diagnostics());
        if self.cancelled(state) {
            return;
        }

        self.emit(build_id, BuildStage::LoadSources, "Discovering source files", state);
        let Some(sources) = self.load_sources(state) else {
            return;
        };
        if self.cancelled(state) {
            return;
        }

        self.emit(build_id, BuildStage::Parse, &format!("Parsing {} JPE file(s)", sources.jpe.len()), state);
        let mut ir = self.parse_sources(sources, state);
        state.project_id = ir.metadata.project_id.clone();
        if has_fatal(&state.diagnostics) || self.cancelled(state) {
            return;
        }

        self.emit(build_id, BuildStage::Transform, "Applying transform plugins", state);
        state.diagnostics.extend(self.plugins.run_transforms(&mut ir));
        state.project_id = ir.metadata.project_id.clone();
        if has_fatal(&state.diagnostics) || self.cancelled(state) {
            return;
        }

        self.emit(build_id, BuildStage::Validate, "Validating project", state);
        state.diagnostics.extend(self.validator.validate(&ir));
        if has_fatal(&state.diagnostics) || self.cancelled(state) {
            return;
        }

        self.emit(build_id, BuildStage::Generate, "Generating tuning XML", state);
        let target_dir = self.output_directory(build_id);
        let outcome = self.generator.generate(&ir, &target_dir);
        state.output_files.extend(outcome.files);
        state.diagnostics.extend(outcome.diagnostics);
        state.diagnostics.extend(self.plugins.run_generators(&ir, &target_dir));
    }

    /// Collect source files; `None` means a fatal diagnostic was recorded
    fn load_sources(&self, state: &mut BuildState) -> Option<LoadedSources> {
        let root = &self.config.project_root;
        if !FileManager::dir_exists(root) {
            state.diagnostics.push(
                Diagnostic::fatal(
                    Category::Project,
                    codes::PROJECT_ROOT_NOT_FOUND,
                    "Project root not found",
                    format!("The project root {:?} does not exist or is not a directory.", root),
                )
                .with_fix("Pass the directory that contains the project's src/ folder"),
            );
            return None;
        }

        let src_dir = root.join("src");
        let jpe_files = if FileManager::dir_exists(&src_dir) {
            match FileManager::find_files(&src_dir, &["jpe"]) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Failed to scan {:?}: {:#}", src_dir, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        if jpe_files.is_empty() {
            state.diagnostics.push(
                Diagnostic::fatal(
                    Category::Project,
                    codes::NO_JPE_FILES,
                    "No JPE source files",
                    format!("No .jpe files were found under {:?}.", src_dir),
                )
                .with_fix("Add at least one .jpe file to the project's src/ directory"),
            );
            return None;
        }

        let claimed = self.plugins.claimed_extensions();
        let plugin_files = if claimed.is_empty() {
            Vec::new()
        } else {
            let extensions: Vec<&str> = claimed.iter().map(String::as_str).collect();
            FileManager::find_files(&src_dir, &extensions).unwrap_or_else(|e| {
                warn!("Failed to scan {:?} for plugin sources: {:#}", src_dir, e);
                Vec::new()
            })
        };

        let mut jpe = Vec::with_capacity(jpe_files.len());
        for path in jpe_files.iter().chain(plugin_files.iter()) {
            match std::fs::read(path) {
                Ok(bytes) => {
                    state.sources.push(SourceFingerprint {
                        path: FileManager::relative_to(path, root),
                        sha256: FileManager::sha256_hex(&bytes),
                    });
                    if jpe_files.contains(path) {
                        jpe.push(SourceFile::new(path.clone(), String::from_utf8_lossy(&bytes).into_owned()));
                    }
                }
                Err(e) => {
                    warn!("Cannot read source {:?}: {}", path, e);
                    state.diagnostics.push(
                        Diagnostic::error(
                            Category::Project,
                            codes::SOURCE_READ_FAILED,
                            "Source file could not be read",
                            format!("Reading {:?} failed: {}; the file was skipped.", path, e),
                        )
                        .with_fix("Check the file permissions")
                        .at(path, 0),
                    );
                }
            }
        }

        debug!("Loaded {} JPE file(s) and {} plugin source(s)", jpe.len(), plugin_files.len());
        Some(LoadedSources { jpe, plugin_files })
    }

    fn parse_sources(&self, sources: LoadedSources, state: &mut BuildState) -> ProjectIR {
        let (mut ir, diagnostics) = self.parser.parse(&sources.jpe);
        state.diagnostics.extend(diagnostics);

        if !sources.plugin_files.is_empty() {
            let (plugin_ir, plugin_diagnostics) = self.plugins.run_parsers(&sources.plugin_files);
            ir.merge(plugin_ir);
            state.diagnostics.extend(plugin_diagnostics);
        }

        ir
    }

    fn parse_and_transform(&self, sources: LoadedSources, state: &mut BuildState) -> ProjectIR {
        let mut ir = self.parse_sources(sources, state);
        if !has_fatal(&state.diagnostics) {
            state.diagnostics.extend(self.plugins.run_transforms(&mut ir));
        }
        ir
    }

    /// Record a cancellation diagnostic when the token fired
    fn cancelled(&self, state: &mut BuildState) -> bool {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => {
                warn!("Build cancelled");
                state.diagnostics.push(
                    Diagnostic::fatal(
                        Category::Internal,
                        codes::BUILD_CANCELLED,
                        "Build cancelled",
                        "The build was cancelled before it completed; no further stages ran.",
                    ),
                );
                true
            }
            _ => false,
        }
    }

    fn emit(&self, build_id: &str, stage: BuildStage, message: &str, state: &BuildState) {
        self.emit_with_count(build_id, stage, message, state.diagnostics.len());
    }

    fn emit_with_count(&self, build_id: &str, stage: BuildStage, message: &str, diagnostics_so_far: usize) {
        debug!("[{:?}] {}", stage, message);
        if let Some(ref callback) = self.progress_callback {
            callback(&BuildProgress {
                build_id: build_id.to_string(),
                stage,
                message: message.to_string(),
                diagnostics_so_far,
            });
        }
    }
}
