/*!
 * Tuning XML generation.
 *
 * - `tuning`: renders each document from the IR
 * - `xml`: writes the fixed document set to disk
 */

pub mod tuning;
pub mod xml;

pub use xml::{GenerationOutcome, XmlGenerator};
