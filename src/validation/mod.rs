/*!
 * Semantic validation of a parsed project.
 *
 * - `entities`: checks on one entity at a time (ids, durations, options, strings)
 * - `references`: project-wide id uniqueness and soft references
 * - `service`: runs every check over a `ProjectIR`
 */

pub mod entities;
pub mod references;
pub mod service;

pub use service::{ProjectValidator, ValidationReport};
