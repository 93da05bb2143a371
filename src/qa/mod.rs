/*!
 * Translation quality assurance.
 *
 * This module scans translated episodes for defects that survive an
 * otherwise fluent translation, and mechanically repairs what it can:
 *
 * - `validator`: pure scan-and-report over one episode's text
 * - `confusables`: fixed similar-character and onomatopoeia tables
 * - `autofix`: literal and backend-assisted repair with a bounded retry loop
 * - `report`: durable per-language QA reports (JSON + text summary)
 */

pub mod autofix;
pub mod confusables;
pub mod report;
pub mod validator;

// Re-export main types
pub use autofix::{auto_fix, validate_and_repair, FixOutcome, RepairOutcome};
pub use report::{EpisodeQaSummary, LanguageQaReport, QaReport};
pub use validator::{IssueKind, QaIssue, QaResult, Severity, TranslationQaValidator};
