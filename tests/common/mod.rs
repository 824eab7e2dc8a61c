/*!
 * Common test utilities for the jpe-translator test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use jpe_translator::{Config, PluginManager, TranslationEngine};

/// Route library logs through env_logger; `RUST_LOG=debug` shows them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a project root whose `src/` holds the given files
pub fn create_project(files: &[(&str, &str)]) -> Result<TempDir> {
    init_test_logging();
    let dir = create_temp_dir()?;
    fs::create_dir_all(dir.path().join("src"))?;
    for (name, content) in files {
        create_test_file(&dir.path().join("src"), name, content)?;
    }
    Ok(dir)
}

/// Config for a project with reports kept inside the project
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::for_project(root);
    config.reports_directory = Some(root.join("reports"));
    config
}

/// Engine without any plugin
pub fn bare_engine(root: &Path) -> TranslationEngine {
    TranslationEngine::new(test_config(root), Arc::new(PluginManager::new()))
}

/// Engine with the given plugin manager
pub fn engine_with(root: &Path, plugins: PluginManager) -> TranslationEngine {
    TranslationEngine::new(test_config(root), Arc::new(plugins))
}

/// A project section every valid sample starts with
pub const PROJECT_SECTION: &str = "[Project]
name: Sample Mod
project_id: sample_mod
version: 1.2.0
author: Tester
end
";

/// A complete valid project: one interaction, buff, trait, enum with three options, two strings
pub const VALID_PROJECT: &str = "[Project]
name: Sample Mod
project_id: sample_mod
version: 1.2.0
end

[Interactions]
id: friendly_chat
display_name: chat_name
participant: role:actor, description:The initiator
participant: target
test: type:sim_info, age:adult
loot: stat:fun, amount:10
end

[Buffs]
id: cheerful
duration: 120
traits: sunny_trait
end

[Traits]
id: sunny_trait
buffs: cheerful
end

[Enums]
id: mood_level
option: LOW, MEDIUM, HIGH
end

[Strings]
chat_name: Have a Chat
chat_desc: Talk about the weather
end
";
