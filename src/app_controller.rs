/*!
 * Pipeline controller.
 *
 * Orchestrates the localization stages over one series directory:
 * split → glossary → translate → QA. Stages are sequential; within a
 * stage, episodes are processed to completion one at a time and a failed
 * episode is recorded and skipped, never allowed to abort the run.
 *
 * The controller owns the cross-cutting concerns the core components stay
 * free of: the rate limit between backend calls, retry budgets, progress
 * reporting and artifact layout.
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::app_config::Config;
use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::glossary::{Glossary, NameConsistencyEnforcer, TermExtractor};
use crate::language_utils::{parse_language, Lang};
use crate::providers::gemini::Gemini;
use crate::providers::{
    with_retries, Backend, PatternDetection, TermCandidate, TitleGuess, TitleSample,
};
use crate::qa::{validate_and_repair, EpisodeQaSummary, LanguageQaReport, QaReport};
use crate::splitting::{Episode, EpisodeSplitter};

/// Serialized form of one episode artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Episode number
    pub number: u32,

    /// Episode title, when present
    pub title: Option<String>,

    /// Text body (source or translated, per metadata)
    pub content: String,

    /// Stage bookkeeping
    #[serde(default)]
    pub metadata: EpisodeMetadata,
}

/// Stage bookkeeping attached to an episode artifact, used to detect and
/// resume partially-processed runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    /// Language this record's content is written in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_to: Option<String>,

    /// Source language of the translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,

    /// "identity" for source-language copies, "llm" for real translations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_type: Option<String>,

    /// Whether a glossary was supplied to the translation call
    #[serde(default)]
    pub glossary_used: bool,

    /// Pre-translation title, kept when the title was translated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
}

impl EpisodeRecord {
    fn from_episode(episode: &Episode) -> Self {
        Self {
            number: episode.number,
            title: episode.title.clone(),
            content: episode.content.clone(),
            metadata: EpisodeMetadata::default(),
        }
    }

    fn to_episode(&self) -> Episode {
        Episode {
            number: self.number,
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// Backend decorator enforcing a minimum wall-clock interval between calls.
///
/// The pause lives here, at the orchestration boundary, so the core
/// components stay unaware of rate limits.
#[derive(Debug)]
pub struct RateLimitedBackend<B> {
    inner: B,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl<B: Backend> RateLimitedBackend<B> {
    pub fn new(inner: B, min_interval: Duration) -> Self {
        Self { inner, min_interval, last_call: Mutex::new(None) }
    }

    async fn pause(&self) {
        let wait = {
            let last = self.last_call.lock();
            match *last {
                Some(at) => self.min_interval.checked_sub(at.elapsed()),
                None => None,
            }
        };
        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
        *self.last_call.lock() = Some(Instant::now());
    }
}

#[async_trait]
impl<B: Backend> Backend for RateLimitedBackend<B> {
    async fn detect_pattern(
        &self,
        sample_text: &str,
        filename: &str,
        sample_lines: usize,
    ) -> Result<PatternDetection, ProviderError> {
        self.pause().await;
        self.inner.detect_pattern(sample_text, filename, sample_lines).await
    }

    async fn extract_terms(
        &self,
        full_series_text: &str,
    ) -> Result<Vec<TermCandidate>, ProviderError> {
        self.pause().await;
        self.inner.extract_terms(full_series_text).await
    }

    async fn translate_term(
        &self,
        term: &str,
        source_lang: Lang,
        target_lang: Lang,
        category: crate::glossary::TermCategory,
        context: &str,
    ) -> Result<String, ProviderError> {
        self.pause().await;
        self.inner.translate_term(term, source_lang, target_lang, category, context).await
    }

    async fn translate_segment(
        &self,
        segment: &str,
        source_lang: Lang,
        target_lang: Lang,
        context: &str,
        glossary_block: &str,
    ) -> Result<String, ProviderError> {
        self.pause().await;
        self.inner
            .translate_segment(segment, source_lang, target_lang, context, glossary_block)
            .await
    }

    async fn translate_episode(
        &self,
        content: &str,
        source_lang: Lang,
        target_lang: Lang,
        glossary_block: &str,
    ) -> Result<String, ProviderError> {
        self.pause().await;
        self.inner.translate_episode(content, source_lang, target_lang, glossary_block).await
    }

    async fn extract_episode_titles(
        &self,
        samples: &[TitleSample],
    ) -> Result<HashMap<usize, TitleGuess>, ProviderError> {
        self.pause().await;
        self.inner.extract_episode_titles(samples).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.pause().await;
        self.inner.test_connection().await
    }
}

/// Per-stage success/failure counters
#[derive(Debug, Clone, Default)]
pub struct StageStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    config: Config,
    backend: Arc<dyn Backend>,
}

impl Controller {
    /// Create a controller with a Gemini backend wrapped in the configured
    /// rate limit
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let gemini = Gemini::new(
            config.provider.api_key.clone(),
            config.provider.endpoint.clone(),
            config.provider.model.clone(),
            config.provider.timeout_secs,
        );
        let backend = Arc::new(RateLimitedBackend::new(
            gemini,
            Duration::from_millis(config.provider.min_call_interval_ms),
        ));

        Ok(Self { config, backend })
    }

    /// Create a controller around an externally constructed backend
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, backend })
    }

    fn source_lang(&self) -> Result<Lang> {
        parse_language(&self.config.source_language)
    }

    fn target_langs(&self) -> Result<Vec<Lang>> {
        self.config.target_languages.iter().map(|l| parse_language(l)).collect()
    }

    fn progress_bar(len: usize, message: &str) -> ProgressBar {
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("█▓▒░"));
        bar.set_message(message.to_string());
        bar
    }

    /// Stage 1: split a manuscript into episode records under
    /// `<series_dir>/01_split/`
    pub async fn run_split(&self, input_file: &Path, series_dir: &Path) -> Result<usize> {
        let text = FileManager::read_manuscript(input_file)?;
        let filename = input_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown.txt".to_string());

        info!("Analyzing pattern for: {}", filename);

        let splitter = EpisodeSplitter::new(self.config.splitter.clone());
        let outcome = splitter.split(&text, &filename, self.backend.as_ref()).await?;

        info!(
            "Split into {} episodes via '{}' (pattern: {}, confidence: {}%)",
            outcome.episodes.len(),
            outcome.method.as_str(),
            outcome.pattern_used,
            outcome.confidence
        );
        for warning in &outcome.warnings {
            warn!("Split warning: {}", warning);
        }

        let split_dir = series_dir.join("01_split");
        FileManager::ensure_dir(&split_dir)?;

        for episode in &outcome.episodes {
            let record = EpisodeRecord::from_episode(episode);
            FileManager::write_json(FileManager::episode_path(&split_dir, episode.number), &record)?;
        }

        Ok(outcome.episodes.len())
    }

    /// Stage 2a: build (or load) one glossary per target language
    pub async fn run_glossary(&self, series_dir: &Path) -> Result<()> {
        let source_lang = self.source_lang()?;
        let episodes = self.load_episodes(&series_dir.join("01_split"))?;
        if episodes.is_empty() {
            return Err(anyhow!("No split episodes found; run the split stage first"));
        }

        let series_name = series_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        for target_lang in self.target_langs()? {
            if target_lang == source_lang {
                continue;
            }

            let glossary_path = FileManager::glossary_path(series_dir, target_lang.as_str());
            if FileManager::file_exists(&glossary_path) {
                let glossary = Glossary::load(&glossary_path)?;
                info!(
                    "Loaded existing glossary for {}: {} terms",
                    target_lang, glossary.term_count()
                );
                continue;
            }

            info!("Creating glossary for {} from full series", target_lang);

            let extractor = TermExtractor::new(self.backend.as_ref(), self.config.provider.max_attempts);
            let enforcer = NameConsistencyEnforcer::new(target_lang)
                .with_positional_fallback(self.config.qa.positional_fallback);

            let (mut glossary, summary, _corrections) = extractor
                .build_glossary(&series_name, &episodes, source_lang, target_lang, &enforcer)
                .await?;

            info!(
                "Glossary for {}: {} terms ({} failed, {} name corrections)",
                target_lang, summary.translated, summary.failed, summary.corrections
            );

            glossary.save(&glossary_path)?;
        }

        Ok(())
    }

    /// Stage 2b: translate episode bodies into each target language under
    /// `<series_dir>/02_translated/<lang>/`
    pub async fn run_translate(&self, series_dir: &Path) -> Result<HashMap<Lang, StageStats>> {
        let source_lang = self.source_lang()?;
        let episodes = self.load_episode_records(&series_dir.join("01_split"))?;
        if episodes.is_empty() {
            return Err(anyhow!("No split episodes found; run the split stage first"));
        }

        let mut all_stats = HashMap::new();

        for target_lang in self.target_langs()? {
            let target_dir = series_dir.join("02_translated").join(target_lang.as_str());
            FileManager::ensure_dir(&target_dir)?;

            let stats = if target_lang == source_lang {
                self.copy_identity_episodes(&episodes, &target_dir, source_lang)?
            } else {
                let glossary_path = FileManager::glossary_path(series_dir, target_lang.as_str());
                let glossary = Glossary::load(&glossary_path)
                    .context("Glossary missing; run the glossary stage first")?;
                self.translate_episodes(&episodes, &target_dir, source_lang, target_lang, &glossary)
                    .await
            };

            info!(
                "{}: processed {}, skipped {}, failed {}",
                target_lang, stats.processed, stats.skipped, stats.failed
            );
            all_stats.insert(target_lang, stats);
        }

        Ok(all_stats)
    }

    /// Source language equals target: episodes are copied, not translated
    fn copy_identity_episodes(
        &self,
        episodes: &[EpisodeRecord],
        target_dir: &Path,
        source_lang: Lang,
    ) -> Result<StageStats> {
        let mut stats = StageStats::default();

        for record in episodes {
            let output = FileManager::episode_path(target_dir, record.number);
            if FileManager::file_exists(&output) {
                stats.skipped += 1;
                continue;
            }

            let mut copy = record.clone();
            copy.metadata.translated_to = Some(source_lang.as_str().to_string());
            copy.metadata.translation_type = Some("identity".to_string());
            FileManager::write_json(&output, &copy)?;
            stats.processed += 1;
        }

        Ok(stats)
    }

    async fn translate_episodes(
        &self,
        episodes: &[EpisodeRecord],
        target_dir: &Path,
        source_lang: Lang,
        target_lang: Lang,
        glossary: &Glossary,
    ) -> StageStats {
        let mut stats = StageStats::default();
        let glossary_block = glossary.format_for_prompt();
        let bar = Self::progress_bar(episodes.len(), target_lang.as_str());

        for record in episodes {
            let output = FileManager::episode_path(target_dir, record.number);

            // Resume support: a record already carrying this target language
            // was finished by an earlier run
            if let Ok(existing) = FileManager::read_json::<EpisodeRecord, _>(&output) {
                if existing.metadata.translated_to.as_deref() == Some(target_lang.as_str()) {
                    stats.skipped += 1;
                    bar.inc(1);
                    continue;
                }
            }

            match self
                .translate_one_episode(record, source_lang, target_lang, &glossary_block)
                .await
            {
                Ok(translated) => {
                    if let Err(e) = FileManager::write_json(&output, &translated) {
                        warn!("Failed to write episode {:03}: {}", record.number, e);
                        stats.failed += 1;
                    } else {
                        stats.processed += 1;
                    }
                }
                Err(e) => {
                    // Partial failure: record it and continue with the next
                    // episode, a later run can resume this one
                    warn!("Failed episode {:03} for {}: {}", record.number, target_lang, e);
                    stats.failed += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        stats
    }

    async fn translate_one_episode(
        &self,
        record: &EpisodeRecord,
        source_lang: Lang,
        target_lang: Lang,
        glossary_block: &str,
    ) -> Result<EpisodeRecord, ProviderError> {
        let max_attempts = self.config.provider.max_attempts;
        let backend = self.backend.as_ref();

        let content = with_retries(max_attempts, "translate_episode", || {
            backend.translate_episode(&record.content, source_lang, target_lang, glossary_block)
        })
        .await?;

        // Title translation failures are tolerable; the source title stays
        let mut title = record.title.clone();
        let mut original_title = None;
        if let Some(source_title) = &record.title {
            match with_retries(max_attempts, "translate_title", || {
                backend.translate_segment(source_title, source_lang, target_lang, "", glossary_block)
            })
            .await
            {
                Ok(translated_title) => {
                    let translated_title = translated_title.trim().to_string();
                    if !translated_title.is_empty() && translated_title != *source_title {
                        original_title = Some(source_title.clone());
                        title = Some(translated_title);
                    }
                }
                Err(e) => warn!("Title translation failed for episode {:03}: {}", record.number, e),
            }
        }

        Ok(EpisodeRecord {
            number: record.number,
            title,
            content,
            metadata: EpisodeMetadata {
                translated_to: Some(target_lang.as_str().to_string()),
                source_language: Some(source_lang.as_str().to_string()),
                translation_type: Some("llm".to_string()),
                glossary_used: true,
                original_title,
            },
        })
    }

    /// Stage 2c: validate translated episodes, auto-fix what is fixable,
    /// and write the durable QA report
    pub async fn run_qa(&self, series_dir: &Path) -> Result<QaReport> {
        let source_lang = self.source_lang()?;
        let series_name = series_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut report = QaReport::new(&series_name);

        for target_lang in self.target_langs()? {
            if target_lang == source_lang {
                continue;
            }

            let lang_dir = series_dir.join("02_translated").join(target_lang.as_str());
            let episode_files = FileManager::list_episode_files(&lang_dir)?;
            if episode_files.is_empty() {
                warn!("No translated episodes found for {}", target_lang);
                continue;
            }

            let glossary =
                Glossary::load(FileManager::glossary_path(series_dir, target_lang.as_str()))?;

            info!("Validating {} ({} episodes)", target_lang, episode_files.len());
            let bar = Self::progress_bar(episode_files.len(), "validating");
            let mut summaries = Vec::new();

            for path in &episode_files {
                match self.qa_one_episode(path, &glossary).await {
                    Ok(summary) => summaries.push(summary),
                    Err(e) => {
                        warn!("Failed to validate {:?}: {}", path, e);
                        summaries.push(EpisodeQaSummary {
                            episode_number: None,
                            passed: false,
                            error_count: 1,
                            warning_count: 0,
                            fixed_count: 0,
                            passes: 0,
                            issues: vec![format!("Validation crashed: {}", e)],
                        });
                    }
                }
                bar.inc(1);
            }
            bar.finish_and_clear();

            let lang_report = LanguageQaReport::from_episodes(target_lang.as_str(), summaries);
            info!(
                "{}: {} - errors: {}, fixed: {}",
                target_lang,
                if lang_report.passed { "PASS" } else { "FAIL" },
                lang_report.error_count,
                lang_report.fixed_count
            );
            report.add_language(lang_report);
        }

        report.save(series_dir)?;
        Ok(report)
    }

    async fn qa_one_episode(&self, path: &Path, glossary: &Glossary) -> Result<EpisodeQaSummary> {
        let mut record: EpisodeRecord = FileManager::read_json(path)?;

        let backend = if self.config.qa.auto_fix {
            Some(self.backend.as_ref())
        } else {
            None
        };
        let max_retries = if self.config.qa.auto_fix { self.config.qa.max_retries } else { 1 };

        let outcome = validate_and_repair(
            glossary,
            &record.content,
            Some(record.number),
            backend,
            max_retries,
        )
        .await;

        if outcome.total_fixed > 0 {
            record.content = outcome.text.clone();
            FileManager::write_json(path, &record)?;
            info!("Episode {:03}: fixed {} issues", record.number, outcome.total_fixed);
        }

        Ok(EpisodeQaSummary::from_outcome(&outcome))
    }

    /// Run the full pipeline for one manuscript
    pub async fn run_pipeline(&self, input_file: &Path, series_dir: &Path) -> Result<QaReport> {
        let episode_count = self.run_split(input_file, series_dir).await?;
        info!("Split stage complete: {} episodes", episode_count);

        self.run_glossary(series_dir).await?;
        info!("Glossary stage complete");

        self.run_translate(series_dir).await?;
        info!("Translation stage complete");

        let report = self.run_qa(series_dir).await?;
        info!(
            "QA stage complete: {} ({} errors, {} fixed)",
            if report.passed() { "PASS" } else { "FAIL" },
            report.total_errors(),
            report.total_fixed()
        );

        Ok(report)
    }

    fn load_episode_records(&self, dir: &Path) -> Result<Vec<EpisodeRecord>> {
        let mut records = Vec::new();
        for path in FileManager::list_episode_files(dir)? {
            records.push(FileManager::read_json(&path)?);
        }
        Ok(records)
    }

    fn load_episodes(&self, dir: &Path) -> Result<Vec<Episode>> {
        Ok(self.load_episode_records(dir)?.iter().map(EpisodeRecord::to_episode).collect())
    }
}
