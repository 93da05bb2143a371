/*!
 * Generation backend for the localization pipeline.
 *
 * This module defines the interface the core components use to delegate
 * actual generation work (pattern detection, term extraction, translation)
 * to an LLM service, plus the client implementations:
 * - Gemini: Google Gemini API client
 * - Mock: scriptable in-memory backend for tests
 *
 * Each operation is a typed method with its own parameter and response
 * types, so an unimplemented operation is a compile error rather than an
 * unknown-string branch at runtime.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::glossary::store::TermCategory;
use crate::language_utils::Lang;

/// A separator pattern suggested by the backend during pattern detection.
///
/// The regex is raw text at this point; the splitter compiles and validates
/// it (capturing group included) before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedPattern {
    /// Symbolic pattern name, e.g. "#N화"
    pub separator_pattern: String,

    /// Sample matched strings from the manuscript
    #[serde(default)]
    pub pattern_examples: Vec<String>,

    /// Regex source with one capturing group for the episode number
    pub pattern_regex: String,
}

/// Special-episode keyword hints detected in the manuscript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecialEpisodes {
    /// Prologue keyword, if present
    #[serde(default)]
    pub prologue: Option<String>,

    /// Epilogue keyword, if present
    #[serde(default)]
    pub epilogue: Option<String>,

    /// Extra/side-story keywords
    #[serde(default)]
    pub extras: Vec<String>,
}

/// Structured result of backend pattern detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDetection {
    /// Whether the manuscript contains more than one episode
    pub is_multi_episode: bool,

    /// All separator patterns found (manuscripts may mix several)
    #[serde(default)]
    pub patterns: Vec<SuggestedPattern>,

    /// Name of the dominant pattern
    #[serde(default)]
    pub primary_pattern: Option<String>,

    /// Estimated total episode count
    #[serde(default)]
    pub estimated_episodes: Option<usize>,

    /// Detection confidence, 0-100
    #[serde(default)]
    pub confidence: u8,

    /// Prologue/epilogue/extra hints
    #[serde(default)]
    pub special_episodes: SpecialEpisodes,

    /// Detected manuscript language
    #[serde(default)]
    pub language: Option<String>,
}

/// A glossary term candidate straight out of extraction, before translation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCandidate {
    /// Source-language surface form
    pub original: String,

    /// Term category
    #[serde(default)]
    pub category: TermCategory,

    /// Free-text usage context
    #[serde(default)]
    pub context: String,
}

/// First lines of one episode, sent for batched title extraction
#[derive(Debug, Clone, Serialize)]
pub struct TitleSample {
    /// Index into the episode list being processed
    pub idx: usize,

    /// Episode number, for the model's benefit
    pub number: u32,

    /// First non-empty lines of content (at most 3)
    pub first_lines: Vec<String>,
}

/// Backend's verdict on whether an episode's opening contains a title line
#[derive(Debug, Clone, Deserialize)]
pub struct TitleGuess {
    /// The extracted title, without the episode-number prefix
    pub title: Option<String>,

    /// Which non-empty line (0-indexed) holds the title
    pub title_line_idx: Option<usize>,
}

/// Common trait for generation backends
///
/// All outbound generation work the pipeline performs goes through this
/// trait, allowing the real API client and the test mock to be used
/// interchangeably.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Detect the episode separator pattern from a manuscript sample
    ///
    /// # Arguments
    /// * `sample_text` - The first `sample_lines` lines of the manuscript
    /// * `filename` - Original filename, for context
    /// * `sample_lines` - How many lines the sample was bounded to
    async fn detect_pattern(
        &self,
        sample_text: &str,
        filename: &str,
        sample_lines: usize,
    ) -> Result<PatternDetection, ProviderError>;

    /// Extract glossary term candidates from the full concatenated series
    ///
    /// Returns originals with category and context only; translation happens
    /// per-term afterwards. Both a character's full name and its bare given
    /// name are expected as separate entries.
    async fn extract_terms(&self, full_series_text: &str)
        -> Result<Vec<TermCandidate>, ProviderError>;

    /// Translate a single glossary term (strict, low-temperature contract)
    async fn translate_term(
        &self,
        term: &str,
        source_lang: Lang,
        target_lang: Lang,
        category: TermCategory,
        context: &str,
    ) -> Result<String, ProviderError>;

    /// Re-translate one leaked segment using its surrounding context and the
    /// relevant glossary subset. Used by QA auto-fix.
    async fn translate_segment(
        &self,
        segment: &str,
        source_lang: Lang,
        target_lang: Lang,
        context: &str,
        glossary_block: &str,
    ) -> Result<String, ProviderError>;

    /// Translate a full episode body with the glossary prompt block
    async fn translate_episode(
        &self,
        content: &str,
        source_lang: Lang,
        target_lang: Lang,
        glossary_block: &str,
    ) -> Result<String, ProviderError>;

    /// Identify embedded title lines for a batch of episodes in one call
    async fn extract_episode_titles(
        &self,
        samples: &[TitleSample],
    ) -> Result<HashMap<usize, TitleGuess>, ProviderError>;

    /// Test the connection to the backend
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

/// Run one backend operation with bounded retries and jittered backoff.
///
/// Only transient failures are retried; authentication and parse errors
/// surface immediately.
pub async fn with_retries<T, Fut>(
    max_attempts: u32,
    op_name: &str,
    mut attempt_fn: impl FnMut() -> Fut,
) -> Result<T, ProviderError>
where
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let jitter = rand::random::<u64>() % 250;
                let delay = std::time::Duration::from_millis(500 * u64::from(attempt) + jitter);
                log::warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    op_name, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error
        .unwrap_or_else(|| ProviderError::RequestFailed(format!("{} exhausted retries", op_name))))
}

pub mod gemini;
pub mod mock;
