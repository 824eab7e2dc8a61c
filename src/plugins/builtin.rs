/*!
 * Built-in plugins shipped with the translator.
 */

use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::PluginConfig;
use crate::diagnostics::Diagnostic;
use crate::errors::PluginError;
use crate::file_utils::FileManager;
use crate::ir::ProjectIR;

use super::manager::PluginManager;
use super::{GeneratorPlugin, ParserPlugin, Plugin};

pub const JSON_SOURCE: &str = "json-source";
pub const RESOURCE_MANIFEST: &str = "resource-manifest";

/// Register every built-in the configuration allows
pub fn register_builtins(manager: &PluginManager, config: &PluginConfig) -> Result<(), PluginError> {
    if config.is_enabled(JSON_SOURCE) {
        manager.register_parser(Arc::new(JsonSourceParser))?;
    }
    if config.is_enabled(RESOURCE_MANIFEST) {
        manager.register_generator(Arc::new(ResourceManifestGenerator))?;
    }
    Ok(())
}

/// Reads a serialized `ProjectIR` from `.json` sources
pub struct JsonSourceParser;

impl Plugin for JsonSourceParser {
    fn name(&self) -> &str {
        JSON_SOURCE
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &str {
        "Loads project entities from JSON-serialized IR files"
    }
}

impl ParserPlugin for JsonSourceParser {
    fn supported_extensions(&self) -> Vec<String> {
        vec!["json".to_string()]
    }

    fn parse(&self, path: &Path) -> Result<(ProjectIR, Vec<Diagnostic>), PluginError> {
        let text = std::fs::read_to_string(path)?;
        let ir: ProjectIR = serde_json::from_str(&text)
            .map_err(|e| PluginError::Parse(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded {} entities from {:?}", ir.entity_count(), path);
        Ok((ir, Vec::new()))
    }
}

/// Manifest listing every resource name per kind
#[derive(Debug, Serialize)]
pub struct ResourceManifest {
    pub project_id: String,
    pub version: String,
    pub resources: BTreeMap<&'static str, Vec<String>>,
}

impl ResourceManifest {
    pub fn from_ir(ir: &ProjectIR) -> Self {
        let mut resources = BTreeMap::new();
        resources.insert("interactions", ir.interactions.iter().map(|i| i.id.name.clone()).collect());
        resources.insert("buffs", ir.buffs.iter().map(|b| b.id.name.clone()).collect());
        resources.insert("traits", ir.traits.iter().map(|t| t.id.name.clone()).collect());
        resources.insert("enums", ir.enums.iter().map(|e| e.id.name.clone()).collect());
        resources.insert("test_sets", ir.test_sets.iter().map(|t| t.id.name.clone()).collect());
        resources.insert(
            "loot_actions",
            ir.loot_actions.iter().filter_map(|l| l.id.as_ref()).map(|id| id.name.clone()).collect(),
        );
        resources.insert("strings", ir.strings.iter().map(|s| s.key.clone()).collect());

        Self {
            project_id: ir.metadata.project_id.clone(),
            version: ir.metadata.version.clone(),
            resources,
        }
    }
}

/// Writes `manifest_<id>.json` next to the XML
pub struct ResourceManifestGenerator;

impl Plugin for ResourceManifestGenerator {
    fn name(&self) -> &str {
        RESOURCE_MANIFEST
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &str {
        "Writes a JSON manifest of every generated resource"
    }
}

impl GeneratorPlugin for ResourceManifestGenerator {
    fn supported_formats(&self) -> Vec<String> {
        vec!["json-manifest".to_string()]
    }

    fn generate(&self, ir: &ProjectIR, target_dir: &Path) -> Result<Vec<Diagnostic>, PluginError> {
        let manifest = ResourceManifest::from_ir(ir);
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| PluginError::failed(self.name(), e.to_string()))?;
        let path = target_dir.join(format!("manifest_{}.json", ir.file_stem()));
        FileManager::write_to_file(&path, &json)
            .map_err(|e| PluginError::failed(self.name(), format!("{:#}", e)))?;
        Ok(Vec::new())
    }
}
