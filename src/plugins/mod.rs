/*!
 * Plugin capabilities and their registry.
 *
 * A plugin implements `Plugin` plus one or more capability traits:
 * `ParserPlugin` reads extra source formats, `TransformPlugin` rewrites the
 * IR between parsing and validation, and `GeneratorPlugin` writes extra
 * artifacts next to the core XML. Plugins are registered in code; there
 * is no dynamic library loading.
 */

pub mod builtin;
pub mod manager;

use std::path::Path;

use crate::diagnostics::Diagnostic;
use crate::errors::PluginError;
use crate::ir::ProjectIR;

pub use manager::PluginManager;

/// Base trait shared by every plugin capability
pub trait Plugin: Send + Sync {
    /// Unique name within a capability, also used for ordering
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn description(&self) -> &str {
        ""
    }
}

/// Parses a non-JPE source format into IR
pub trait ParserPlugin: Plugin {
    /// File extensions handled, without the dot
    fn supported_extensions(&self) -> Vec<String>;

    fn parse(&self, path: &Path) -> Result<(ProjectIR, Vec<Diagnostic>), PluginError>;
}

/// Rewrites or extends the IR before validation.
///
/// On `Err` or panic the manager restores the IR as it was before the call.
pub trait TransformPlugin: Plugin {
    fn transform(&self, ir: &mut ProjectIR) -> Result<Vec<Diagnostic>, PluginError>;
}

/// Emits additional artifacts into the build output directory
pub trait GeneratorPlugin: Plugin {
    fn supported_formats(&self) -> Vec<String>;

    fn generate(&self, ir: &ProjectIR, target_dir: &Path) -> Result<Vec<Diagnostic>, PluginError>;
}
