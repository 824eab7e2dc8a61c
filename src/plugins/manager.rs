/*!
 * Plugin registry and fault-isolated invocation.
 *
 * The manager is built once at startup and shared behind an `Arc` by any
 * number of engines. Every plugin call runs under `catch_unwind`, so a
 * failing or panicking plugin becomes a `PLUGIN_FAILED` diagnostic and the
 * remaining plugins still run.
 */

use log::{debug, error, info};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::PluginConfig;
use crate::diagnostics::{codes, Category, Diagnostic};
use crate::errors::{panic_message, PluginError};
use crate::ir::ProjectIR;

use super::builtin;
use super::{GeneratorPlugin, ParserPlugin, Plugin, TransformPlugin};

/// Registry of parser, transform and generator plugins
#[derive(Default)]
pub struct PluginManager {
    parsers: RwLock<Vec<Arc<dyn ParserPlugin>>>,
    transforms: RwLock<Vec<Arc<dyn TransformPlugin>>>,
    generators: RwLock<Vec<Arc<dyn GeneratorPlugin>>>,
}

fn register_into<T: ?Sized + Plugin>(list: &RwLock<Vec<Arc<T>>>, plugin: Arc<T>, kind: &str) -> Result<(), PluginError> {
    let mut plugins = list.write();
    if plugins.iter().any(|existing| existing.name() == plugin.name()) {
        return Err(PluginError::Duplicate(plugin.name().to_string()));
    }
    debug!("Registered {} plugin '{}' v{}", kind, plugin.name(), plugin.version());
    plugins.push(plugin);
    Ok(())
}

/// Snapshot sorted by name; the sort is stable so ties keep registration order
fn sorted<T: ?Sized + Plugin>(list: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    let mut plugins = list.read().clone();
    plugins.sort_by(|a, b| a.name().cmp(b.name()));
    plugins
}

fn plugin_failed(plugin: &str, stage: &str, error: &PluginError) -> Diagnostic {
    Diagnostic::error(
        Category::Plugin,
        codes::PLUGIN_FAILED,
        format!("Plugin '{}' failed during {}", plugin, stage),
        error.to_string(),
    )
    .with_fix("Check the plugin's input or disable the plugin in the configuration")
    .with_resource(plugin)
}

/// Run one plugin call, turning `Err` and panics into a `PluginError`
fn guarded<R>(plugin: &str, call: impl FnOnce() -> Result<R, PluginError>) -> Result<R, PluginError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(PluginError::Panicked {
            plugin: plugin.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

impl PluginManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-ins the configuration allows
    pub fn discover(config: &PluginConfig) -> Result<Self, PluginError> {
        let manager = Self::new();
        builtin::register_builtins(&manager, config)?;
        info!("Plugin discovery finished: {} plugin(s) available", manager.plugin_count());
        Ok(manager)
    }

    pub fn register_parser(&self, plugin: Arc<dyn ParserPlugin>) -> Result<(), PluginError> {
        register_into(&self.parsers, plugin, "parser")
    }

    pub fn register_transform(&self, plugin: Arc<dyn TransformPlugin>) -> Result<(), PluginError> {
        register_into(&self.transforms, plugin, "transform")
    }

    pub fn register_generator(&self, plugin: Arc<dyn GeneratorPlugin>) -> Result<(), PluginError> {
        register_into(&self.generators, plugin, "generator")
    }

    pub fn get_parser_plugins(&self) -> Vec<Arc<dyn ParserPlugin>> {
        sorted(&self.parsers)
    }

    pub fn get_transform_plugins(&self) -> Vec<Arc<dyn TransformPlugin>> {
        sorted(&self.transforms)
    }

    pub fn get_generator_plugins(&self) -> Vec<Arc<dyn GeneratorPlugin>> {
        sorted(&self.generators)
    }

    pub fn plugin_count(&self) -> usize {
        self.parsers.read().len() + self.transforms.read().len() + self.generators.read().len()
    }

    /// First parser plugin, by name order, claiming an extension
    pub fn parser_for_extension(&self, extension: &str) -> Option<Arc<dyn ParserPlugin>> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.get_parser_plugins().into_iter().find(|plugin| {
            plugin
                .supported_extensions()
                .iter()
                .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(&extension))
        })
    }

    /// Every extension claimed by a parser plugin, lowercase and deduplicated
    pub fn claimed_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .get_parser_plugins()
            .iter()
            .flat_map(|plugin| plugin.supported_extensions())
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| ext != "jpe")
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// One `PLUGIN_LOADED` info diagnostic per registered plugin
    pub fn loaded_diagnostics(&self) -> Vec<Diagnostic> {
        let mut entries: Vec<(&str, String, String)> = Vec::new();
        for plugin in self.get_parser_plugins() {
            entries.push(("parser", plugin.name().to_string(), plugin.version().to_string()));
        }
        for plugin in self.get_transform_plugins() {
            entries.push(("transform", plugin.name().to_string(), plugin.version().to_string()));
        }
        for plugin in self.get_generator_plugins() {
            entries.push(("generator", plugin.name().to_string(), plugin.version().to_string()));
        }

        entries
            .into_iter()
            .map(|(kind, name, version)| {
                Diagnostic::info(
                    Category::Plugin,
                    codes::PLUGIN_LOADED,
                    format!("Loaded {} plugin '{}'", kind, name),
                    format!("The {} plugin '{}' version {} is active for this build.", kind, name, version),
                )
                .with_resource(name)
            })
            .collect()
    }

    /// Parse plugin-claimed files and merge the results into one IR
    pub fn run_parsers(&self, files: &[PathBuf]) -> (ProjectIR, Vec<Diagnostic>) {
        let mut merged = ProjectIR::new();
        let mut diagnostics = Vec::new();

        for file in files {
            let extension = file
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default();
            let Some(plugin) = self.parser_for_extension(&extension) else {
                continue;
            };

            debug!("Parsing {:?} with plugin '{}'", file, plugin.name());
            match guarded(plugin.name(), || plugin.parse(file)) {
                Ok((ir, plugin_diagnostics)) => {
                    merged.merge(ir);
                    diagnostics.extend(plugin_diagnostics);
                }
                Err(e) => {
                    error!("Parser plugin '{}' failed on {:?}: {}", plugin.name(), file, e);
                    diagnostics.push(plugin_failed(plugin.name(), "parsing", &e).at(file, 0));
                }
            }
        }

        (merged, diagnostics)
    }

    /// Apply every transform plugin in order.
    ///
    /// A plugin that fails leaves the IR exactly as it received it.
    pub fn run_transforms(&self, ir: &mut ProjectIR) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for plugin in self.get_transform_plugins() {
            let snapshot = ir.clone();
            debug!("Running transform plugin '{}'", plugin.name());

            match guarded(plugin.name(), || plugin.transform(ir)) {
                Ok(plugin_diagnostics) => diagnostics.extend(plugin_diagnostics),
                Err(e) => {
                    error!("Transform plugin '{}' failed: {}", plugin.name(), e);
                    *ir = snapshot;
                    diagnostics.push(plugin_failed(plugin.name(), "transform", &e));
                }
            }
        }

        diagnostics
    }

    /// Run every generator plugin against the output directory
    pub fn run_generators(&self, ir: &ProjectIR, target_dir: &Path) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for plugin in self.get_generator_plugins() {
            debug!("Running generator plugin '{}'", plugin.name());

            match guarded(plugin.name(), || plugin.generate(ir, target_dir)) {
                Ok(plugin_diagnostics) => diagnostics.extend(plugin_diagnostics),
                Err(e) => {
                    error!("Generator plugin '{}' failed: {}", plugin.name(), e);
                    diagnostics.push(plugin_failed(plugin.name(), "generation", &e));
                }
            }
        }

        diagnostics
    }
}
