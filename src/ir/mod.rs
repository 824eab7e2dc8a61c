/*!
 * Intermediate representation for JPE projects.
 *
 * `ProjectIR` is the single aggregate passed between every pipeline stage:
 * - built empty at the start of a build
 * - populated by the parser (and parser plugins)
 * - rewritten by transform plugins
 * - read by the validator and the generators
 */

pub mod model;
pub mod value;

// Re-export types used by other modules
pub use model::{
    Buff, EnumDefinition, EnumOption, Interaction, InteractionParticipant, LocalizedString,
    LootAction, ProjectIR, ProjectMetadata, ResourceId, TestCondition, TestLogic, TestOperand,
    TestSet, Trait, DEFAULT_LOCALE,
};
pub use value::ParamValue;
