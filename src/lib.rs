/*!
 * # jpe-translator - JPE to tuning XML translator
 *
 * A Rust library that turns projects written in JPE, a line-oriented
 * section/`end` authoring language, into the XML tuning files a game
 * engine consumes.
 *
 * ## Features
 *
 * - Recoverable parsing of JPE sources into a typed IR
 * - Semantic validation reporting every defect in one run
 * - Generation of the fixed tuning document set
 * - Parser, transform and generator plugins with fault isolation
 * - A JSON build report for every build, failed ones included
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `ir`: the intermediate representation (`ProjectIR` and its entities)
 * - `diagnostics`: coded findings shared by every stage
 * - `parser`: JPE text to IR
 * - `validation`: semantic checks over the IR
 * - `generator`: IR to tuning XML
 * - `plugins`: plugin capabilities and the `PluginManager`
 * - `engine`: the staged `TranslationEngine` and build reports
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod file_utils;
pub mod generator;
pub mod ir;
pub mod parser;
pub mod plugins;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use diagnostics::{Category, Diagnostic, DiagnosticSummary, Severity};
pub use engine::{BuildReport, BuildReportWriter, BuildStatus, CancellationToken, TranslationEngine};
pub use errors::{AppError, ConfigError, GenerationError, PluginError};
pub use generator::XmlGenerator;
pub use ir::ProjectIR;
pub use parser::JpeParser;
pub use plugins::PluginManager;
pub use validation::ProjectValidator;
