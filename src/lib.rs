/*!
 * # SeriLoc - Serialized web-novel localization with AI
 *
 * A Rust library for localizing serialized web-novel manuscripts into
 * multiple target languages with glossary-enforced terminology consistency.
 *
 * ## Features
 *
 * - Split merged manuscripts into episodes via tiered pattern detection
 *   (known-pattern catalog, combined markers, inline markers, AI-assisted
 *   fallback) with confidence scoring
 * - Build per-series, per-language glossaries from a single extraction pass
 *   over the whole series
 * - Enforce consistent renderings between full names, given names and
 *   compound phrases across target scripts
 * - Detect and auto-repair translation defects: leaked source-language
 *   text, untranslated glossary terms, confusable-character substitutions
 * - Durable per-language QA reports (JSON + human-readable summary)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `splitting`: Episode boundary detection and split execution
 * - `glossary`: Terminology store, extraction workflow, name consistency
 * - `qa`: Translation validation, auto-fix and reporting
 * - `providers`: Generation backend clients (Gemini, test mock)
 * - `file_utils`: Pipeline artifact I/O
 * - `app_controller`: Stage orchestration
 * - `language_utils`: Language identifiers and script ranges
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod glossary;
pub mod language_utils;
pub mod providers;
pub mod qa;
pub mod splitting;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, GlossaryError, ProviderError, QaError, SplitError};
pub use glossary::{Glossary, GlossaryTerm, NameConsistencyEnforcer, TermCategory};
pub use language_utils::{languages_match, parse_language, Lang};
pub use qa::{QaIssue, QaReport, QaResult, TranslationQaValidator};
pub use splitting::{Episode, EpisodeSplitter, PatternCatalog};
