/*!
 * Tests for the plugin manager and plugin capabilities
 */

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use jpe_translator::app_config::PluginConfig;
use jpe_translator::diagnostics::{codes, Diagnostic, Severity};
use jpe_translator::errors::PluginError;
use jpe_translator::ir::{ProjectIR, Trait};
use jpe_translator::plugins::builtin::{JSON_SOURCE, RESOURCE_MANIFEST};
use jpe_translator::plugins::{GeneratorPlugin, ParserPlugin, Plugin, PluginManager};
use crate::common;

/// Parser plugin reading one trait name per line of a `.traits` file
struct TraitListParser;

impl Plugin for TraitListParser {
    fn name(&self) -> &str {
        "trait-list"
    }
}

impl ParserPlugin for TraitListParser {
    fn supported_extensions(&self) -> Vec<String> {
        vec![".Traits".to_string()]
    }

    fn parse(&self, path: &Path) -> Result<(ProjectIR, Vec<Diagnostic>), PluginError> {
        let text = std::fs::read_to_string(path)?;
        let mut ir = ProjectIR::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            ir.traits.push(Trait { id: line.trim().into(), ..Default::default() });
        }
        Ok((ir, Vec::new()))
    }
}

/// Generator plugin that always panics
struct ExplodingGenerator;

impl Plugin for ExplodingGenerator {
    fn name(&self) -> &str {
        "exploding"
    }
}

impl GeneratorPlugin for ExplodingGenerator {
    fn supported_formats(&self) -> Vec<String> {
        vec!["nothing".to_string()]
    }

    fn generate(&self, _ir: &ProjectIR, _target_dir: &Path) -> Result<Vec<Diagnostic>, PluginError> {
        panic!("generator exploded");
    }
}

#[test]
fn test_discover_withDefaults_shouldRegisterBuiltins() -> Result<()> {
    let manager = PluginManager::discover(&PluginConfig::default())?;

    assert_eq!(manager.plugin_count(), 2);
    assert_eq!(manager.get_parser_plugins()[0].name(), JSON_SOURCE);
    assert_eq!(manager.get_generator_plugins()[0].name(), RESOURCE_MANIFEST);
    assert_eq!(manager.claimed_extensions(), vec!["json".to_string()]);
    Ok(())
}

#[test]
fn test_discover_withBuiltinsDisabled_shouldBeEmpty() -> Result<()> {
    let config = PluginConfig {
        enable_builtin: false,
        disabled: Vec::new(),
    };

    let manager = PluginManager::discover(&config)?;

    assert_eq!(manager.plugin_count(), 0);
    assert!(manager.loaded_diagnostics().is_empty());
    Ok(())
}

#[test]
fn test_parserForExtension_shouldMatchCaseInsensitively() {
    let manager = PluginManager::new();
    manager.register_parser(Arc::new(TraitListParser)).unwrap();

    assert!(manager.parser_for_extension("traits").is_some());
    assert!(manager.parser_for_extension("TRAITS").is_some());
    assert!(manager.parser_for_extension("json").is_none());
    assert_eq!(manager.claimed_extensions(), vec!["traits".to_string()]);
}

#[test]
fn test_registerParser_twice_shouldRejectDuplicate() {
    let manager = PluginManager::new();
    manager.register_parser(Arc::new(TraitListParser)).unwrap();

    let result = manager.register_parser(Arc::new(TraitListParser));

    assert!(matches!(result, Err(PluginError::Duplicate(ref name)) if name == "trait-list"));
}

#[test]
fn test_runParsers_shouldMergeAndReportFailures() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let good = common::create_test_file(temp_dir.path(), "extra.traits", "brave\ncurious\n")?;
    let missing: PathBuf = temp_dir.path().join("gone.traits");
    let manager = PluginManager::new();
    manager.register_parser(Arc::new(TraitListParser))?;

    let (ir, diagnostics) = manager.run_parsers(&[good, missing]);

    assert_eq!(ir.traits.len(), 2);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::PLUGIN_FAILED);
    assert_eq!(diagnostics[0].resource_id.as_deref(), Some("trait-list"));
    Ok(())
}

#[test]
fn test_runGenerators_withPanickingPlugin_shouldIsolateAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let manager = PluginManager::discover(&PluginConfig::default())?;
    manager.register_generator(Arc::new(ExplodingGenerator))?;
    let mut ir = ProjectIR::new();
    ir.metadata.project_id = "iso".to_string();

    let diagnostics = manager.run_generators(&ir, temp_dir.path());

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(diagnostics[0].message_long.contains("generator exploded"));
    assert!(temp_dir.path().join("manifest_iso.json").is_file());
    Ok(())
}
