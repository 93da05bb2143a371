/*!
 * Durable QA reports.
 *
 * Per-episode issues are ephemeral; what persists is the aggregate: per
 * language pass/fail with error/warning/fixed counts and per-episode issue
 * summaries, serialized both as JSON for machines and as a text summary
 * for humans, so failures are inspectable without re-running the stage.
 */

use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::file_utils::FileManager;
use crate::qa::autofix::RepairOutcome;

/// Aggregate of one episode's validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeQaSummary {
    /// Episode number, when known
    pub episode_number: Option<u32>,

    /// Whether the final validation pass was clean of errors
    pub passed: bool,

    /// Error-severity issues remaining
    pub error_count: usize,

    /// Warning-severity issues remaining
    pub warning_count: usize,

    /// Fixes applied by the repair loop
    pub fixed_count: usize,

    /// Validation passes consumed
    pub passes: u32,

    /// Messages of the remaining issues
    pub issues: Vec<String>,
}

impl EpisodeQaSummary {
    /// Summarize a finished repair loop
    pub fn from_outcome(outcome: &RepairOutcome) -> Self {
        Self {
            episode_number: outcome.result.episode_number,
            passed: outcome.result.passed,
            error_count: outcome.result.error_count(),
            warning_count: outcome.result.warning_count(),
            fixed_count: outcome.total_fixed,
            passes: outcome.passes,
            issues: outcome.result.issues.iter().map(|i| i.message.clone()).collect(),
        }
    }
}

/// Aggregate of one target language's validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageQaReport {
    /// Target language identifier
    pub language: String,

    /// Whether every episode passed
    pub passed: bool,

    /// Total remaining errors
    pub error_count: usize,

    /// Total remaining warnings
    pub warning_count: usize,

    /// Total fixes applied
    pub fixed_count: usize,

    /// Per-episode summaries
    pub episodes: Vec<EpisodeQaSummary>,
}

impl LanguageQaReport {
    /// Build the language aggregate from per-episode summaries
    pub fn from_episodes(language: &str, episodes: Vec<EpisodeQaSummary>) -> Self {
        Self {
            language: language.to_string(),
            passed: episodes.iter().all(|e| e.passed),
            error_count: episodes.iter().map(|e| e.error_count).sum(),
            warning_count: episodes.iter().map(|e| e.warning_count).sum(),
            fixed_count: episodes.iter().map(|e| e.fixed_count).sum(),
            episodes,
        }
    }
}

/// Full QA report for one series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReport {
    /// Series the report covers
    pub series_name: String,

    /// Report timestamp, RFC 3339
    pub generated_at: String,

    /// Per-language aggregates
    pub languages: Vec<LanguageQaReport>,
}

impl QaReport {
    pub fn new(series_name: &str) -> Self {
        Self {
            series_name: series_name.to_string(),
            generated_at: Local::now().to_rfc3339(),
            languages: Vec::new(),
        }
    }

    pub fn add_language(&mut self, report: LanguageQaReport) {
        self.languages.push(report);
    }

    /// The run passes iff every language passed
    pub fn passed(&self) -> bool {
        self.languages.iter().all(|l| l.passed)
    }

    pub fn total_errors(&self) -> usize {
        self.languages.iter().map(|l| l.error_count).sum()
    }

    pub fn total_fixed(&self) -> usize {
        self.languages.iter().map(|l| l.fixed_count).sum()
    }

    /// Render the human-readable summary
    pub fn to_text_summary(&self) -> String {
        let mut lines = vec![
            format!("Translation QA Report - {}", self.series_name),
            format!("Generated: {}", self.generated_at),
            String::new(),
        ];

        for lang in &self.languages {
            let status = if lang.passed { "PASS" } else { "FAIL" };
            lines.push(format!(
                "[{}] {} - errors: {}, warnings: {}, fixed: {}",
                status, lang.language, lang.error_count, lang.warning_count, lang.fixed_count
            ));

            for episode in lang.episodes.iter().filter(|e| !e.passed) {
                let number = episode
                    .episode_number
                    .map(|n| format!("{:03}", n))
                    .unwrap_or_else(|| "???".to_string());
                lines.push(format!(
                    "  Episode {}: {} errors, {} warnings",
                    number, episode.error_count, episode.warning_count
                ));
                for message in &episode.issues {
                    lines.push(format!("    - {}", message));
                }
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Overall: {} ({} errors, {} fixed)",
            if self.passed() { "PASS" } else { "FAIL" },
            self.total_errors(),
            self.total_fixed()
        ));

        lines.join("\n")
    }

    /// Write the JSON record and the text summary side by side
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        FileManager::write_json(dir.join("qa_report.json"), self)?;
        FileManager::write_to_file(dir.join("qa_report.txt"), &self.to_text_summary())?;
        Ok(())
    }
}
