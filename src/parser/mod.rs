/*!
 * JPE parsing.
 *
 * - `jpe`: tokenizes files into sections and assembles the project
 * - `sections`: turns each section into IR entities
 */

pub mod jpe;
pub mod sections;

pub use jpe::{JpeParser, SourceFile};
pub use sections::SectionKind;
