/*!
 * Glossary subsystem for terminology consistency.
 *
 * - `store`: the versioned term store, one per series per target language
 * - `extraction`: full-series term extraction and translation workflow
 * - `consistency`: full-name/given-name consistency enforcement
 */

pub mod consistency;
pub mod extraction;
pub mod store;

// Re-export main types
pub use consistency::{CorrectionLog, CorrectionReason, CorrectionRecord, NameConsistencyEnforcer};
pub use extraction::{ExtractionSummary, TermExtractor};
pub use store::{Glossary, GlossaryTerm, TermCategory};
