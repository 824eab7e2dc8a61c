/*!
 * Build orchestration.
 *
 * - `orchestrator`: the staged `TranslationEngine`
 * - `report`: the persisted `BuildReport`
 */

pub mod orchestrator;
pub mod report;

pub use orchestrator::{BuildProgress, BuildStage, CancellationToken, ProgressCallback, TranslationEngine};
pub use report::{sanitize_build_id, BuildReport, BuildReportWriter, BuildStatus, SourceFingerprint};
