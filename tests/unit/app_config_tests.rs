/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::path::PathBuf;
use jpe_translator::app_config::{Config, LogLevel};
use jpe_translator::errors::ConfigError;
use log::LevelFilter;
use crate::common;

/// Test that the defaults are sensible and valid
#[test]
fn test_default_config_shouldBeValid() {
    let config = Config::default();

    assert_eq!(config.project_root, PathBuf::from("."));
    assert_eq!(config.generator.indent_size, 4);
    assert!(config.plugins.enable_builtin);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test that a partial JSON file falls back to defaults for missing fields
#[test]
fn test_load_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"project_root": "mods/demo", "log_level": "debug", "plugins": {"disabled": ["resource-manifest"]}}"#,
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.project_root, PathBuf::from("mods/demo"));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.plugins.enable_builtin);
    assert!(!config.plugins.is_enabled("resource-manifest"));
    assert!(config.plugins.is_enabled("json-source"));
    assert_eq!(config.generator.indent_size, 4);
    Ok(())
}

/// Test that load_or_default tolerates a missing file
#[test]
fn test_load_or_default_withMissingFile_shouldReturnDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("absent.json");

    let config = Config::load_or_default(Some(&missing))?;

    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_default(None)?, Config::default());
    Ok(())
}

/// Test that malformed JSON is reported as an error
#[test]
fn test_load_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "bad.json", "{ nope")?;

    assert!(Config::load(&path).is_err());
    Ok(())
}

/// Test that save and load agree
#[test]
fn test_save_thenLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("saved.json");
    let mut config = Config::for_project("mods/saved");
    config.generator.output_file_prefix = Some("mymod_".to_string());
    config.reports_directory = Some(PathBuf::from("out/reports"));

    config.save(&path)?;
    let loaded = Config::load(&path)?;

    assert_eq!(loaded, config);
    Ok(())
}

/// Test the validation rules
#[test]
fn test_validate_withInvalidValues_shouldNameTheField() {
    let mut config = Config::default();
    config.generator.indent_size = 40;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue { ref field, .. }) if field == "generator.indent_size"
    ));

    let mut config = Config::default();
    config.generator.output_file_prefix = Some("a/b".to_string());
    assert!(config.validate().is_err());

    let mut config = Config::for_project("");
    config.generator.indent_size = 2;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.plugins.disabled.push("  ".to_string());
    assert!(config.validate().is_err());
}

/// Test that the configured reports directory wins
#[test]
fn test_resolved_reports_directory_withConfiguredDir_shouldUseIt() {
    let mut config = Config::for_project("/tmp/project");
    config.reports_directory = Some(PathBuf::from("/tmp/reports"));

    assert_eq!(config.resolved_reports_directory(), PathBuf::from("/tmp/reports"));

    config.reports_directory = None;
    assert!(config.resolved_reports_directory().ends_with("reports"));
}

/// Test the log level mapping
#[test]
fn test_log_level_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
}
