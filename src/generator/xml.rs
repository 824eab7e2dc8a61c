/*!
 * XML generator writing the fixed set of tuning documents.
 */

use log::{debug, error};
use std::path::{Path, PathBuf};

use crate::app_config::GeneratorConfig;
use crate::diagnostics::{codes, Category, Diagnostic};
use crate::errors::GenerationError;
use crate::file_utils::FileManager;
use crate::ir::ProjectIR;

use super::tuning::{
    render_buffs, render_enums, render_interactions, render_project, render_strings, render_traits,
};

type Renderer = fn(&ProjectIR, usize) -> Result<String, GenerationError>;

/// Output kinds in write order; the kind doubles as the file name prefix
const DOCUMENTS: [(&str, Renderer); 6] = [
    ("project", render_project),
    ("interactions", render_interactions),
    ("buffs", render_buffs),
    ("traits", render_traits),
    ("enums", render_enums),
    ("strings", render_strings),
];

/// Files written and problems met by one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub files: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Serializes a `ProjectIR` into tuning XML files
#[derive(Debug, Clone, Default)]
pub struct XmlGenerator {
    config: GeneratorConfig,
}

impl XmlGenerator {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Names of the six documents for a project, in write order
    pub fn file_names(&self, ir: &ProjectIR) -> Vec<String> {
        let stem = ir.file_stem();
        let prefix = self.config.output_file_prefix.as_deref().unwrap_or("");
        DOCUMENTS
            .iter()
            .map(|(kind, _)| format!("{}{}_{}.xml", prefix, kind, stem))
            .collect()
    }

    /// Write every document into `target_dir`, creating it when absent.
    ///
    /// Works on invalid projects too. A document that fails is reported
    /// and the remaining ones are still written.
    pub fn generate(&self, ir: &ProjectIR, target_dir: &Path) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::default();

        if let Err(e) = FileManager::ensure_dir(target_dir) {
            error!("Cannot create output directory {:?}: {:#}", target_dir, e);
            outcome.diagnostics.push(write_failed(target_dir, &format!("{:#}", e)));
            return outcome;
        }

        for ((_, render), file_name) in DOCUMENTS.iter().zip(self.file_names(ir)) {
            let path = target_dir.join(&file_name);

            let document = match render(ir, self.config.indent_size) {
                Ok(document) => document,
                Err(e) => {
                    error!("Failed to encode {}: {}", file_name, e);
                    outcome.diagnostics.push(
                        Diagnostic::error(
                            Category::Generation,
                            codes::XML_ENCODING_FAILED,
                            format!("Could not encode {}", file_name),
                            format!("Serializing {} to XML failed: {}", file_name, e),
                        )
                        .with_fix("Check the project for characters that cannot appear in XML"),
                    );
                    continue;
                }
            };

            match FileManager::write_to_file(&path, &document) {
                Ok(()) => {
                    debug!("Wrote {:?} ({} bytes)", path, document.len());
                    outcome.files.push(path);
                }
                Err(e) => {
                    error!("Failed to write {:?}: {:#}", path, e);
                    outcome.diagnostics.push(write_failed(&path, &format!("{:#}", e)));
                }
            }
        }

        outcome
    }
}

fn write_failed(path: &Path, reason: &str) -> Diagnostic {
    Diagnostic::error(
        Category::Generation,
        codes::OUTPUT_WRITE_FAILED,
        format!("Could not write {}", path.display()),
        format!("Writing {} failed: {}", path.display(), reason),
    )
    .with_fix("Check that the build directory is writable and the disk is not full")
}
