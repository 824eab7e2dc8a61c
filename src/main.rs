// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use jpe_translator::app_config::{self, Config};
use jpe_translator::diagnostics::{Diagnostic, DiagnosticSummary, Severity};
use jpe_translator::engine::{BuildProgress, BuildStage};
use jpe_translator::errors::AppError;
use jpe_translator::{PluginManager, TranslationEngine};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a JPE project into tuning XML and write a build report
    Build(BuildArgs),

    /// Parse and validate a project without writing any output
    #[command(alias = "lint")]
    Validate(ProjectArgs),

    /// Generate shell completions for jpe-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every project command
#[derive(Args, Debug)]
struct ProjectArgs {
    /// Project root containing the src/ directory
    #[arg(value_name = "PROJECT_ROOT")]
    project_root: PathBuf,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Do not register the built-in plugins
    #[arg(long)]
    no_builtin_plugins: bool,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Build identifier; a random one is generated when omitted
    #[arg(short, long)]
    build_id: Option<String>,

    /// Directory receiving build_<id>.json
    #[arg(short, long, value_name = "DIR", env = "JPE_REPORTS_DIR")]
    reports_dir: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

/// jpe-translator - JPE to tuning XML translator
#[derive(Parser, Debug)]
#[command(name = "jpe-translator")]
#[command(version)]
#[command(about = "Translate JPE projects into game tuning XML")]
#[command(long_about = "jpe-translator parses JPE sources, validates them and writes tuning XML.

EXAMPLES:
    jpe-translator build ./my_mod                      # Build with a random build id
    jpe-translator build ./my_mod -b nightly           # Build into build/nightly/
    jpe-translator build ./my_mod -r ./reports         # Write the report to ./reports
    jpe-translator validate ./my_mod                   # Report problems without output
    jpe-translator completions bash > jpe.bash         # Generate bash completions

CONFIGURATION:
    An optional JSON configuration file can be given with --config. Command
    line flags override the values it contains.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger accepts everything; `log::set_max_level` does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "jpe-translator", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Build(args) => run_build(args),
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Load the configuration and apply the command line overrides
fn load_config(args: &ProjectArgs) -> Result<Config> {
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(path) = &args.config {
        if !path.exists() {
            warn!("Config file not found at {:?}, using defaults.", path);
        }
    }

    config.project_root = args.project_root.clone();
    if let Some(level) = &args.log_level {
        config.log_level = level.clone().into();
    }
    if args.no_builtin_plugins {
        config.plugins.enable_builtin = false;
    }

    config
        .validate()
        .map_err(AppError::from)
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

fn load_plugins(config: &Config) -> Result<Arc<PluginManager>> {
    let manager = PluginManager::discover(&config.plugins)
        .map_err(AppError::from)
        .context("Plugin discovery failed")?;
    Ok(Arc::new(manager))
}

fn progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(BuildStage::TOTAL_STEPS as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{bar:30}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar
}

fn run_build(args: BuildArgs) -> Result<ExitCode> {
    let mut config = load_config(&args.project)?;
    if let Some(dir) = &args.reports_dir {
        config.reports_directory = Some(dir.clone());
    }

    let build_id = args
        .build_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let plugins = load_plugins(&config)?;

    info!("Building {:?} as {}", config.project_root, build_id);

    let mut engine = TranslationEngine::new(config, plugins);
    let bar = if args.no_progress { None } else { Some(progress_bar()) };
    if let Some(bar) = &bar {
        let bar = bar.clone();
        engine = engine.with_progress_callback(Box::new(move |progress: &BuildProgress| {
            bar.set_position(progress.stage.step() as u64);
            bar.set_message(progress.message.clone());
        }));
    }

    let report = engine.build_from_jpe(&build_id);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    print_diagnostics(&report.errors);
    match &report.report_path {
        Some(path) => info!("Report: {}", path.display()),
        None => warn!("The build report could not be written"),
    }
    for file in &report.output_files {
        debug!("Generated {}", file.display());
    }
    println!("{}", report.summary_line());

    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_validate(args: ProjectArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let plugins = load_plugins(&config)?;
    let root = config.project_root.clone();

    let diagnostics = TranslationEngine::new(config, plugins).validate_only();
    print_diagnostics(&diagnostics);

    let summary = DiagnosticSummary::from_diagnostics(&diagnostics);
    println!("{}: {}", display_root(&root), summary.summary());

    Ok(if summary.failures() == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Fatal | Severity::Error => error!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Info => debug!("{}", diagnostic),
        }
        if let Some(fix) = &diagnostic.suggested_fix {
            if diagnostic.is_failure() {
                info!("  fix: {}", fix);
            }
        }
    }
}

fn display_root(root: &Path) -> String {
    root.canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .display()
        .to_string()
}
