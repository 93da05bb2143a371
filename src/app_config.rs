use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::language_utils::parse_language;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language of the manuscripts (e.g. "korean")
    pub source_language: String,

    /// Target languages to localize into
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Generation backend config
    pub provider: ProviderConfig,

    /// Episode splitter config
    #[serde(default)]
    pub splitter: SplitterConfig,

    /// Translation QA config
    #[serde(default)]
    pub qa: QaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Generation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL (empty for the public endpoint)
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retry attempts for transient API failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    // @field: Minimum wall-clock interval between backend calls (ms)
    #[serde(default = "default_min_call_interval_ms")]
    pub min_call_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            min_call_interval_ms: default_min_call_interval_ms(),
        }
    }
}

/// Episode splitter configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SplitterConfig {
    // @field: Lines sent to the backend for pattern detection
    #[serde(default = "default_sample_lines")]
    pub sample_lines: usize,

    // @field: Matches a cataloged pattern needs for direct acceptance
    #[serde(default = "default_min_direct_matches")]
    pub min_direct_matches: usize,

    // @field: Merge co-occurring marker variants into one combined pattern
    #[serde(default = "default_true")]
    pub detect_combined: bool,

    // @field: How many times more inline matches are needed to prefer the
    // inline interpretation over the best line-start pattern
    #[serde(default = "default_inline_preference_ratio")]
    pub inline_preference_ratio: f64,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            sample_lines: default_sample_lines(),
            min_direct_matches: default_min_direct_matches(),
            detect_combined: default_true(),
            inline_preference_ratio: default_inline_preference_ratio(),
        }
    }
}

/// Translation QA configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QaConfig {
    // @field: Attempt mechanical repair of detected issues
    #[serde(default = "default_true")]
    pub auto_fix: bool,

    // @field: Validate-fix-revalidate iterations per episode
    #[serde(default = "default_qa_max_retries")]
    pub max_retries: u32,

    // @field: Positional window heuristic in the name-consistency pass
    #[serde(default = "default_true")]
    pub positional_fallback: bool,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            auto_fix: default_true(),
            max_retries: default_qa_max_retries(),
            positional_fallback: default_true(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_target_languages() -> Vec<String> {
    vec!["japanese".to_string(), "traditional_chinese".to_string()]
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_call_interval_ms() -> u64 {
    1000
}

fn default_sample_lines() -> usize {
    500
}

fn default_min_direct_matches() -> usize {
    3
}

fn default_inline_preference_ratio() -> f64 {
    1.5
}

fn default_qa_max_retries() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "korean".to_string(),
            target_languages: default_target_languages(),
            provider: ProviderConfig::default(),
            splitter: SplitterConfig::default(),
            qa: QaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        parse_language(&self.source_language)
            .map_err(|e| anyhow!("Invalid source_language: {}", e))?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        for lang in &self.target_languages {
            parse_language(lang).map_err(|e| anyhow!("Invalid target language: {}", e))?;
        }

        if !self.provider.endpoint.is_empty() {
            Url::parse(&self.provider.endpoint)
                .map_err(|e| anyhow!("Invalid provider endpoint '{}': {}", self.provider.endpoint, e))?;
        }

        if self.provider.max_attempts == 0 {
            return Err(anyhow!("provider.max_attempts must be at least 1"));
        }

        if self.splitter.sample_lines == 0 {
            return Err(anyhow!("splitter.sample_lines must be at least 1"));
        }

        if self.splitter.inline_preference_ratio < 1.0 {
            return Err(anyhow!("splitter.inline_preference_ratio must be >= 1.0"));
        }

        Ok(())
    }
}
