/*!
 * Mock backend implementation for testing.
 *
 * The mock is scripted: each operation returns canned data configured by the
 * test, with optional failure injection. Unscripted translation calls fall
 * back to deterministic marker transforms so pipeline tests can assert on
 * output shape without a live API.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::glossary::store::TermCategory;
use crate::language_utils::Lang;
use crate::providers::{
    Backend, PatternDetection, TermCandidate, TitleGuess, TitleSample,
};

/// Failure injection mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// All operations succeed
    Working,
    /// All operations fail with a request error
    Failing,
    /// Structured-output operations return unparseable payloads
    MalformedJson,
}

/// Scriptable mock backend
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Canned pattern detection result
    detection: Option<PatternDetection>,
    /// Canned term candidates
    term_candidates: Vec<TermCandidate>,
    /// original -> translation used by translate_term
    term_translations: HashMap<String, String>,
    /// segment -> translation used by translate_segment
    segment_translations: HashMap<String, String>,
    /// content -> translation used by translate_episode
    episode_translations: HashMap<String, String>,
    /// idx -> (title, title_line_idx) used by extract_episode_titles
    titles: HashMap<usize, (Option<String>, Option<usize>)>,
    /// Total operation invocations
    call_count: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a working mock with no scripted data
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock whose every operation fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that simulates malformed structured output
    pub fn malformed_json() -> Self {
        Self::new(MockBehavior::MalformedJson)
    }

    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            detection: None,
            term_candidates: Vec::new(),
            term_translations: HashMap::new(),
            segment_translations: HashMap::new(),
            episode_translations: HashMap::new(),
            titles: HashMap::new(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script the pattern detection result
    pub fn with_detection(mut self, detection: PatternDetection) -> Self {
        self.detection = Some(detection);
        self
    }

    /// Script the term extraction result
    pub fn with_term_candidates(mut self, candidates: Vec<TermCandidate>) -> Self {
        self.term_candidates = candidates;
        self
    }

    /// Script one term translation
    pub fn with_term_translation(mut self, original: &str, translation: &str) -> Self {
        self.term_translations.insert(original.to_string(), translation.to_string());
        self
    }

    /// Script one segment translation
    pub fn with_segment_translation(mut self, segment: &str, translation: &str) -> Self {
        self.segment_translations.insert(segment.to_string(), translation.to_string());
        self
    }

    /// Script one full-episode translation
    pub fn with_episode_translation(mut self, content: &str, translation: &str) -> Self {
        self.episode_translations.insert(content.to_string(), translation.to_string());
        self
    }

    /// Script one title extraction entry
    pub fn with_title(mut self, idx: usize, title: &str, line_idx: usize) -> Self {
        self.titles.insert(idx, (Some(title.to_string()), Some(line_idx)));
        self
    }

    /// Number of operations invoked so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Failing => {
                Err(ProviderError::RequestFailed("mock backend failure".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn structured_gate(&self) -> Result<(), ProviderError> {
        self.gate()?;
        if self.behavior == MockBehavior::MalformedJson {
            return Err(ProviderError::ParseError(
                "Malformed JSON from backend: expected value (payload: I am not JSON)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn detect_pattern(
        &self,
        _sample_text: &str,
        _filename: &str,
        _sample_lines: usize,
    ) -> Result<PatternDetection, ProviderError> {
        self.structured_gate()?;

        Ok(self.detection.clone().unwrap_or(PatternDetection {
            is_multi_episode: false,
            patterns: Vec::new(),
            primary_pattern: None,
            estimated_episodes: Some(1),
            confidence: 50,
            special_episodes: Default::default(),
            language: Some("korean".to_string()),
        }))
    }

    async fn extract_terms(
        &self,
        _full_series_text: &str,
    ) -> Result<Vec<TermCandidate>, ProviderError> {
        self.structured_gate()?;
        Ok(self.term_candidates.clone())
    }

    async fn translate_term(
        &self,
        term: &str,
        _source_lang: Lang,
        target_lang: Lang,
        _category: TermCategory,
        _context: &str,
    ) -> Result<String, ProviderError> {
        self.gate()?;
        Ok(self
            .term_translations
            .get(term)
            .cloned()
            .unwrap_or_else(|| format!("{}:{}", target_lang.as_str(), term)))
    }

    async fn translate_segment(
        &self,
        segment: &str,
        _source_lang: Lang,
        _target_lang: Lang,
        _context: &str,
        _glossary_block: &str,
    ) -> Result<String, ProviderError> {
        self.gate()?;
        // Unscripted segments come back unchanged, which the auto-fix layer
        // must then reject as still containing source script
        Ok(self
            .segment_translations
            .get(segment)
            .cloned()
            .unwrap_or_else(|| segment.to_string()))
    }

    async fn translate_episode(
        &self,
        content: &str,
        _source_lang: Lang,
        target_lang: Lang,
        _glossary_block: &str,
    ) -> Result<String, ProviderError> {
        self.gate()?;
        Ok(self
            .episode_translations
            .get(content)
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_lang.as_str(), content)))
    }

    async fn extract_episode_titles(
        &self,
        samples: &[TitleSample],
    ) -> Result<HashMap<usize, TitleGuess>, ProviderError> {
        self.structured_gate()?;

        let mut guesses = HashMap::new();
        for sample in samples {
            if let Some((title, line_idx)) = self.titles.get(&sample.idx) {
                guesses.insert(
                    sample.idx,
                    TitleGuess { title: title.clone(), title_line_idx: *line_idx },
                );
            }
        }
        Ok(guesses)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.gate()
    }
}
