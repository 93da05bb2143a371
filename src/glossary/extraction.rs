/*!
 * Glossary construction from a full series.
 *
 * One extraction pass runs over the entire concatenated series (episode
 * order only affects extraction context, not correctness), then every
 * candidate is translated individually under the strict single-term
 * contract. A term whose translation fails or comes back overlong is
 * skipped and counted, never allowed to abort the run: one bad term must
 * not block the rest of the glossary.
 */

use log::{info, warn};

use crate::errors::ProviderError;
use crate::glossary::consistency::{CorrectionLog, NameConsistencyEnforcer};
use crate::glossary::store::{Glossary, GlossaryTerm};
use crate::language_utils::Lang;
use crate::providers::{with_retries, Backend};
use crate::splitting::Episode;

/// Counters from one glossary build
#[derive(Debug, Clone, Default)]
pub struct ExtractionSummary {
    /// Candidates the backend extracted
    pub extracted: usize,

    /// Terms successfully translated and added
    pub translated: usize,

    /// Terms skipped after translation failure or rejection
    pub failed: usize,

    /// Name-consistency corrections applied afterwards
    pub corrections: usize,
}

/// Builds and extends glossaries through the backend
pub struct TermExtractor<'a> {
    backend: &'a dyn Backend,
    max_attempts: u32,
}

impl<'a> TermExtractor<'a> {
    pub fn new(backend: &'a dyn Backend, max_attempts: u32) -> Self {
        Self { backend, max_attempts }
    }

    /// Concatenate episode bodies with boundary markers for extraction
    pub fn concat_series(episodes: &[Episode]) -> String {
        let mut combined = String::new();
        for (i, episode) in episodes.iter().enumerate() {
            combined.push_str(&format!("\n=== Episode {} ===\n", i + 1));
            combined.push_str(&episode.content);
            combined.push('\n');
        }
        combined
    }

    /// Build a fresh glossary for one series/target-language pair
    pub async fn build_glossary(
        &self,
        series_name: &str,
        episodes: &[Episode],
        source_lang: Lang,
        target_lang: Lang,
        enforcer: &NameConsistencyEnforcer,
    ) -> Result<(Glossary, ExtractionSummary, CorrectionLog), ProviderError> {
        let combined = Self::concat_series(episodes);
        info!(
            "Extracting terms from full series: {} episodes, {} chars",
            episodes.len(),
            combined.chars().count()
        );

        let candidates = with_retries(self.max_attempts, "extract_terms", || {
            self.backend.extract_terms(&combined)
        })
        .await?;

        info!("Extracted {} term candidates", candidates.len());

        let mut glossary = Glossary::create(series_name, source_lang, target_lang);
        let mut summary = ExtractionSummary {
            extracted: candidates.len(),
            ..ExtractionSummary::default()
        };

        for candidate in &candidates {
            let translated = with_retries(self.max_attempts, "translate_term", || {
                self.backend.translate_term(
                    &candidate.original,
                    source_lang,
                    target_lang,
                    candidate.category,
                    &candidate.context,
                )
            })
            .await;

            match translated {
                Ok(translation) => {
                    let translation = translation.trim();
                    let ceiling = candidate.category.max_translation_len();
                    if translation.chars().count() > ceiling {
                        // The model wrote prose instead of a term
                        warn!(
                            "Translation too long for term '{}' ({} chars > {}), skipping",
                            candidate.original,
                            translation.chars().count(),
                            ceiling
                        );
                        summary.failed += 1;
                        continue;
                    }

                    if glossary.add_term(GlossaryTerm::new(
                        &candidate.original,
                        translation,
                        candidate.category,
                        &candidate.context,
                    )) {
                        summary.translated += 1;
                    }
                }
                Err(e) => {
                    warn!("Term translation failed for '{}': {}", candidate.original, e);
                    summary.failed += 1;
                }
            }
        }

        let corrections = enforcer.enforce(&mut glossary.terms);
        summary.corrections = corrections.count();

        Ok((glossary, summary, corrections))
    }

    /// Extend an existing glossary with terms from newly added episodes.
    ///
    /// Candidates already present keep their established translation; only
    /// genuinely new originals are translated and appended.
    pub async fn extend_glossary(
        &self,
        glossary: &mut Glossary,
        episodes: &[Episode],
        enforcer: &NameConsistencyEnforcer,
    ) -> Result<ExtractionSummary, ProviderError> {
        let combined = Self::concat_series(episodes);
        let candidates = with_retries(self.max_attempts, "extract_terms", || {
            self.backend.extract_terms(&combined)
        })
        .await?;

        let fresh = glossary.filter_new_terms(&candidates);
        let mut summary = ExtractionSummary {
            extracted: fresh.len(),
            ..ExtractionSummary::default()
        };

        for candidate in &fresh {
            let translated = with_retries(self.max_attempts, "translate_term", || {
                self.backend.translate_term(
                    &candidate.original,
                    glossary.source_language,
                    glossary.target_language,
                    candidate.category,
                    &candidate.context,
                )
            })
            .await;

            match translated {
                Ok(translation) => {
                    let translation = translation.trim();
                    if translation.chars().count() > candidate.category.max_translation_len() {
                        warn!("Translation too long for term '{}', skipping", candidate.original);
                        summary.failed += 1;
                        continue;
                    }
                    if glossary.add_term(GlossaryTerm::new(
                        &candidate.original,
                        translation,
                        candidate.category,
                        &candidate.context,
                    )) {
                        summary.translated += 1;
                    }
                }
                Err(e) => {
                    warn!("Term translation failed for '{}': {}", candidate.original, e);
                    summary.failed += 1;
                }
            }
        }

        let corrections = enforcer.enforce(&mut glossary.terms);
        summary.corrections = corrections.count();

        Ok(summary)
    }
}
