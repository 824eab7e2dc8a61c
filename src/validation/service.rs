/*!
 * Validation service that runs every project check.
 *
 * The validator is stateless: it never mutates the project and never
 * stops at the first problem, so one run reports everything.
 */

use log::debug;

use crate::diagnostics::{Diagnostic, DiagnosticSummary};
use crate::ir::ProjectIR;

use super::entities::{
    check_buff, check_enum, check_interaction, check_metadata, check_strings, check_test_set,
    check_trait,
};
use super::references::check_references;

/// Outcome of validating one project
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Every finding, in check order
    pub diagnostics: Vec<Diagnostic>,
    /// Counts by severity
    pub summary: DiagnosticSummary,
}

impl ValidationReport {
    /// Whether no error or fatal diagnostic was found
    pub fn passed(&self) -> bool {
        self.summary.failures() == 0
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!("Validation: {}", self.summary.summary())
    }
}

/// Semantic validator for `ProjectIR`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectValidator;

impl ProjectValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a project and return every diagnostic found
    pub fn validate(&self, ir: &ProjectIR) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        check_metadata(&ir.metadata, &mut diagnostics);

        for (index, interaction) in ir.interactions.iter().enumerate() {
            check_interaction(index, interaction, &mut diagnostics);
        }
        for (index, buff) in ir.buffs.iter().enumerate() {
            check_buff(index, buff, &mut diagnostics);
        }
        for (index, tuning_trait) in ir.traits.iter().enumerate() {
            check_trait(index, tuning_trait, &mut diagnostics);
        }
        for (index, definition) in ir.enums.iter().enumerate() {
            check_enum(index, definition, &mut diagnostics);
        }
        for (index, test_set) in ir.test_sets.iter().enumerate() {
            check_test_set(index, test_set, &mut diagnostics);
        }
        check_strings(&ir.strings, &mut diagnostics);

        check_references(ir, &mut diagnostics);

        debug!(
            "Validated {} entities: {}",
            ir.entity_count(),
            DiagnosticSummary::from_diagnostics(&diagnostics).summary()
        );

        diagnostics
    }

    /// Validate and bundle the result with severity counts
    pub fn report(&self, ir: &ProjectIR) -> ValidationReport {
        let diagnostics = self.validate(ir);
        let summary = DiagnosticSummary::from_diagnostics(&diagnostics);
        ValidationReport { diagnostics, summary }
    }
}
