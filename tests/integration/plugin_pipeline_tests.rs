/*!
 * Plugins exercised through full builds
 */

use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use jpe_translator::app_config::PluginConfig;
use jpe_translator::diagnostics::{codes, Category, Diagnostic, Severity};
use jpe_translator::engine::BuildStatus;
use jpe_translator::errors::PluginError;
use jpe_translator::ir::{LocalizedString, ProjectIR};
use jpe_translator::plugins::{ParserPlugin, Plugin, PluginManager, TransformPlugin};
use crate::common;

/// Adds a credits string to every project
struct CreditsTransform;

impl Plugin for CreditsTransform {
    fn name(&self) -> &str {
        "b-credits"
    }
}

impl TransformPlugin for CreditsTransform {
    fn transform(&self, ir: &mut ProjectIR) -> Result<Vec<Diagnostic>, PluginError> {
        ir.strings.push(LocalizedString::new("credits", "Made with care"));
        Ok(Vec::new())
    }
}

/// Wipes the project, then panics
struct WipingTransform;

impl Plugin for WipingTransform {
    fn name(&self) -> &str {
        "a-wiper"
    }
}

impl TransformPlugin for WipingTransform {
    fn transform(&self, ir: &mut ProjectIR) -> Result<Vec<Diagnostic>, PluginError> {
        *ir = ProjectIR::new();
        panic!("wiper lost control");
    }
}

/// Rejects every `.fx` source with a fatal diagnostic
struct FatalFxParser;

impl Plugin for FatalFxParser {
    fn name(&self) -> &str {
        "fx-source"
    }
}

impl ParserPlugin for FatalFxParser {
    fn supported_extensions(&self) -> Vec<String> {
        vec!["fx".to_string()]
    }

    fn parse(&self, path: &Path) -> Result<(ProjectIR, Vec<Diagnostic>), PluginError> {
        let fatal = Diagnostic::fatal(
            Category::Plugin,
            "FX_UNSUPPORTED",
            "Unsupported effect file",
            format!("{:?} uses an effect format this build cannot handle.", path),
        );
        Ok((ProjectIR::new(), vec![fatal]))
    }
}

/// Flags whether it was ever called
struct RecordingTransform {
    ran: Arc<AtomicBool>,
}

impl Plugin for RecordingTransform {
    fn name(&self) -> &str {
        "recorder"
    }
}

impl TransformPlugin for RecordingTransform {
    fn transform(&self, _ir: &mut ProjectIR) -> Result<Vec<Diagnostic>, PluginError> {
        self.ran.store(true, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn fatal_parser_manager(ran: &Arc<AtomicBool>) -> Result<PluginManager> {
    let manager = PluginManager::new();
    manager.register_parser(Arc::new(FatalFxParser))?;
    manager.register_transform(Arc::new(RecordingTransform { ran: Arc::clone(ran) }))?;
    Ok(manager)
}

fn builtin_manager() -> Result<PluginManager> {
    Ok(PluginManager::discover(&PluginConfig::default())?)
}

/// JSON sources are merged and the manifest is written next to the XML
#[test]
fn test_build_withJsonSource_shouldMergeAndWriteManifest() -> Result<()> {
    let project = common::create_project(&[
        ("mod.jpe", common::VALID_PROJECT),
        ("extra.json", r#"{"buffs": [{"id": {"name": "json_buff"}, "duration_sim_minutes": 15}]}"#),
    ])?;

    let report = common::engine_with(project.path(), builtin_manager()?).build_from_jpe("json");

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.sources.len(), 2);
    let build_dir = project.path().join("build").join("json");
    let buffs = std::fs::read_to_string(build_dir.join("buffs_sample_mod.xml"))?;
    assert!(buffs.contains("n=\"json_buff\""));
    assert!(build_dir.join("manifest_sample_mod.json").is_file());
    assert_eq!(
        report.diagnostics_with_code(codes::PLUGIN_LOADED).count(),
        2
    );
    Ok(())
}

/// Broken JSON fails the build but the JPE output is still generated
#[test]
fn test_build_withBrokenJsonSource_shouldReportPluginFailure() -> Result<()> {
    let project = common::create_project(&[
        ("mod.jpe", common::VALID_PROJECT),
        ("broken.json", "{ this is not json"),
    ])?;

    let report = common::engine_with(project.path(), builtin_manager()?).build_from_jpe("badjson");

    assert_eq!(report.status, BuildStatus::Failed);
    let failure = report
        .diagnostics_with_code(codes::PLUGIN_FAILED)
        .next()
        .expect("plugin failure reported");
    assert_eq!(failure.severity, Severity::Error);
    assert_eq!(failure.resource_id.as_deref(), Some("json-source"));
    assert_eq!(report.output_files.len(), 6);
    Ok(())
}

/// JSON files are left alone when the built-ins are disabled
#[test]
fn test_build_withBuiltinsDisabled_shouldIgnoreJsonFiles() -> Result<()> {
    let project = common::create_project(&[
        ("mod.jpe", common::VALID_PROJECT),
        ("broken.json", "{ this is not json"),
    ])?;
    let manager = PluginManager::discover(&PluginConfig {
        enable_builtin: false,
        disabled: Vec::new(),
    })?;

    let report = common::engine_with(project.path(), manager).build_from_jpe("nojson");

    assert!(report.is_success(), "{:?}", report.errors);
    assert_eq!(report.sources.len(), 1);
    Ok(())
}

/// A panicking transform is isolated; the IR is restored and the next transform runs
#[test]
fn test_build_withPanickingTransform_shouldRestoreIrAndContinue() -> Result<()> {
    let project = common::create_project(&[("mod.jpe", common::VALID_PROJECT)])?;
    let manager = PluginManager::new();
    manager.register_transform(Arc::new(CreditsTransform))?;
    manager.register_transform(Arc::new(WipingTransform))?;

    let report = common::engine_with(project.path(), manager).build_from_jpe("isolated");

    assert_eq!(report.status, BuildStatus::Failed);
    let failure = report
        .diagnostics_with_code(codes::PLUGIN_FAILED)
        .next()
        .expect("plugin failure reported");
    assert!(failure.message_long.contains("wiper lost control"));
    assert_eq!(report.project_id, "sample_mod");

    let strings_file = project.path().join("build").join("isolated").join("strings_sample_mod.xml");
    let strings = std::fs::read_to_string(strings_file)?;
    assert!(strings.contains("<string id=\"credits\" locale=\"en_US\">Made with care</string>"));
    assert!(strings.contains("chat_name"));
    Ok(())
}

/// A fatal from a parser plugin skips the remaining stages straight to the report
#[test]
fn test_build_withFatalFromParserPlugin_shouldSkipToReport() -> Result<()> {
    let project = common::create_project(&[("mod.jpe", common::VALID_PROJECT), ("glow.fx", "shader")])?;
    let ran = Arc::new(AtomicBool::new(false));

    let report = common::engine_with(project.path(), fatal_parser_manager(&ran)?).build_from_jpe("fatal_parse");

    assert_eq!(report.status, BuildStatus::Failed);
    assert!(report.has_code("FX_UNSUPPORTED"));
    assert!(!ran.load(Ordering::SeqCst));
    assert!(report.output_files.is_empty());
    assert!(!project.path().join("build").join("fatal_parse").exists());
    assert!(report.report_path.is_some());
    Ok(())
}

/// Validation without output stops at the same fatal
#[test]
fn test_validateOnly_withFatalFromParserPlugin_shouldNotTransform() -> Result<()> {
    let project = common::create_project(&[("mod.jpe", common::VALID_PROJECT), ("glow.fx", "shader")])?;
    let ran = Arc::new(AtomicBool::new(false));

    let diagnostics = common::engine_with(project.path(), fatal_parser_manager(&ran)?).validate_only();

    assert!(diagnostics.iter().any(|d| d.code == "FX_UNSUPPORTED" && d.severity == Severity::Fatal));
    assert!(!ran.load(Ordering::SeqCst));
    Ok(())
}
