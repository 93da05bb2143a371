use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::glossary::store::TermCategory;
use crate::language_utils::Lang;
use crate::providers::{
    Backend, PatternDetection, TermCandidate, TitleGuess, TitleSample,
};

/// Gemini client for interacting with the Google Gemini API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Model identifier, e.g. "gemini-2.5-flash"
    model: String,
}

/// Gemini generation request
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Conversation contents
    contents: Vec<GeminiContent>,

    /// Generation parameters
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// One content block in a Gemini request or response
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Message parts
    pub parts: Vec<GeminiPart>,
}

/// Text part of a content block
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// The actual text content
    pub text: String,
}

/// Generation parameters
#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Force JSON output when set to "application/json"
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

/// Gemini response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Response candidates (the first one is used)
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One candidate in a Gemini response
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// The generated content
    pub content: GeminiContent,
}

impl GeminiRequest {
    /// Create a new request carrying a single user prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: None,
        }
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        let config = self.generation_config.get_or_insert(GenerationConfig {
            temperature: None,
            response_mime_type: None,
        });
        config.temperature = Some(temperature);
        self
    }

    /// Force structured JSON output
    pub fn json_output(mut self) -> Self {
        let config = self.generation_config.get_or_insert(GenerationConfig {
            temperature: None,
            response_mime_type: None,
        });
        config.response_mime_type = Some("application/json".to_string());
        self
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Complete a generation request
    pub async fn complete(&self, request: GeminiRequest) -> Result<String, ProviderError> {
        let base = if self.endpoint.is_empty() {
            "https://generativelanguage.googleapis.com".to_string()
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        };
        let api_url = format!("{}/v1beta/models/{}:generateContent", base, self.model);

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Gemini API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimitExceeded(error_text));
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthenticationError(error_text));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini API response: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::ParseError("Gemini response contained no text".to_string()));
        }

        Ok(text)
    }

    /// Parse a structured JSON payload out of a model response, tolerating
    /// markdown code fences around the JSON body.
    fn parse_json_payload<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, ProviderError> {
        let stripped = strip_code_fences(raw);
        serde_json::from_str(stripped.trim()).map_err(|e| {
            let preview: String = stripped.chars().take(300).collect();
            ProviderError::ParseError(format!("Malformed JSON from backend: {} (payload: {})", e, preview))
        })
    }
}

/// Remove surrounding ``` / ```json fences the model sometimes adds despite
/// the JSON output instruction
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if let Some(last) = lines.last() {
        if last.trim() == "```" {
            lines.pop();
        }
    }
    lines.join("\n").trim().to_string()
}

const DETECT_PATTERN_PROMPT: &str = r##"Analyze this text file and identify episode separation patterns.

**Filename:** {filename}

**First {sample_lines} lines:**
```
{sample}
```

**Tasks:**
1. Determine if this file contains a SINGLE episode or MULTIPLE episodes
2. If multiple, identify ALL separator patterns used (files may mix patterns)
3. For EACH pattern: name the STRUCTURAL format (e.g. "#N화", "$NNN", "第N話"),
   collect 3-5 example matches, and write a regex with exactly one capturing
   group extracting the episode number
4. Estimate total number of episodes
5. Rate your confidence (0-100)
6. Identify special episodes (prologue, epilogue, extras)
7. Detect language (korean, japanese, english)

**Important:**
- Patterns appear at the START of lines, not inside dialogue
- Use placeholders like [Title] for varying title text, never literal titles
- The capturing group for the episode number is MANDATORY

**Response format (JSON only, no markdown):**
{
    "is_multi_episode": true,
    "patterns": [
        {"separator_pattern": "$NNN", "pattern_examples": ["$001", "$002"], "pattern_regex": "^\\$(\\d{3})"}
    ],
    "primary_pattern": "$NNN",
    "estimated_episodes": 50,
    "confidence": 95,
    "special_episodes": {"prologue": null, "epilogue": null, "extras": []},
    "language": "korean"
}"##;

const EXTRACT_TERMS_PROMPT: &str = r#"Extract every recurring proper noun and terminology item from this web novel that must translate consistently across episodes.

Categories: character, location, organization, title, item, skill, term.

**Critical naming rule:** when a character name of 3+ characters decomposes
into a single-character surname plus a given name of 2+ characters, output
BOTH the full name and the bare given name as separate entries.

Return a flat JSON array, no count limit, no markdown:
[{"original": "이서연", "category": "character", "context": "female lead"}, ...]

**Text:**
{text}"#;

const TRANSLATE_TERM_PROMPT: &str = r#"Translate this single {category} term from {source} to {target}.

Term: {term}
Context: {context}

Respond with ONLY the translated term. No explanation, no script, no alternatives."#;

const TRANSLATE_SEGMENT_PROMPT: &str = r#"This {source} fragment was left untranslated inside a {target} text. Translate ONLY the fragment so it reads naturally in its surrounding context.

Fragment: {segment}

Surrounding context:
{context}

{glossary}

Respond with ONLY the translated fragment."#;

const TRANSLATE_EPISODE_PROMPT: &str = r#"Translate this web novel episode from {source} to {target}. Preserve paragraph breaks and dialogue formatting. Use the glossary translations exactly as given.

{glossary}

**Episode text:**
{text}

Respond with ONLY the translated episode text."#;

const EXTRACT_TITLES_PROMPT: &str = r#"Analyze these episode beginnings and extract titles if present.

**Episodes to analyze:**
{samples}

**Instructions:**
1. Look for title lines like "1화 - 제목", "제1화: 제목", "第1話 - タイトル"
2. The title line usually appears at the very beginning
3. Return the title (WITHOUT the episode-number prefix) and the 0-indexed
   non-empty line that contains it
4. Return null for both fields when there is no title

**Response format (JSON only):**
{"results": [{"idx": 0, "title": "두 세계 사이에서", "title_line_idx": 0}, {"idx": 1, "title": null, "title_line_idx": null}]}"#;

/// Wire format of one entry in the title-extraction response
#[derive(Debug, Deserialize)]
struct TitleResultEntry {
    idx: usize,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    title_line_idx: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TitleResults {
    #[serde(default)]
    results: Vec<TitleResultEntry>,
}

#[async_trait]
impl Backend for Gemini {
    async fn detect_pattern(
        &self,
        sample_text: &str,
        filename: &str,
        sample_lines: usize,
    ) -> Result<PatternDetection, ProviderError> {
        let prompt = DETECT_PATTERN_PROMPT
            .replace("{filename}", filename)
            .replace("{sample_lines}", &sample_lines.to_string())
            .replace("{sample}", sample_text);

        let raw = self.complete(GeminiRequest::new(prompt).temperature(0.1)).await?;
        let detection: PatternDetection = Self::parse_json_payload(&raw)?;

        debug!(
            "Pattern detection: multi={}, {} pattern(s), confidence={}",
            detection.is_multi_episode,
            detection.patterns.len(),
            detection.confidence
        );

        Ok(detection)
    }

    async fn extract_terms(
        &self,
        full_series_text: &str,
    ) -> Result<Vec<TermCandidate>, ProviderError> {
        let prompt = EXTRACT_TERMS_PROMPT.replace("{text}", full_series_text);
        let raw = self
            .complete(GeminiRequest::new(prompt).temperature(0.1).json_output())
            .await?;
        Self::parse_json_payload(&raw)
    }

    async fn translate_term(
        &self,
        term: &str,
        source_lang: Lang,
        target_lang: Lang,
        category: TermCategory,
        context: &str,
    ) -> Result<String, ProviderError> {
        let prompt = TRANSLATE_TERM_PROMPT
            .replace("{category}", category.as_str())
            .replace("{source}", source_lang.display_name())
            .replace("{target}", target_lang.display_name())
            .replace("{term}", term)
            .replace("{context}", if context.is_empty() { "N/A" } else { context });

        let raw = self.complete(GeminiRequest::new(prompt).temperature(0.0)).await?;
        Ok(strip_code_fences(&raw))
    }

    async fn translate_segment(
        &self,
        segment: &str,
        source_lang: Lang,
        target_lang: Lang,
        context: &str,
        glossary_block: &str,
    ) -> Result<String, ProviderError> {
        let prompt = TRANSLATE_SEGMENT_PROMPT
            .replace("{source}", source_lang.display_name())
            .replace("{target}", target_lang.display_name())
            .replace("{segment}", segment)
            .replace("{context}", context)
            .replace("{glossary}", glossary_block);

        let raw = self.complete(GeminiRequest::new(prompt).temperature(0.1)).await?;
        Ok(strip_code_fences(&raw))
    }

    async fn translate_episode(
        &self,
        content: &str,
        source_lang: Lang,
        target_lang: Lang,
        glossary_block: &str,
    ) -> Result<String, ProviderError> {
        let prompt = TRANSLATE_EPISODE_PROMPT
            .replace("{source}", source_lang.display_name())
            .replace("{target}", target_lang.display_name())
            .replace("{glossary}", glossary_block)
            .replace("{text}", content);

        let raw = self.complete(GeminiRequest::new(prompt).temperature(0.3)).await?;
        Ok(strip_code_fences(&raw))
    }

    async fn extract_episode_titles(
        &self,
        samples: &[TitleSample],
    ) -> Result<HashMap<usize, TitleGuess>, ProviderError> {
        let samples_json = serde_json::to_string_pretty(samples)
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to serialize title samples: {}", e)))?;
        let prompt = EXTRACT_TITLES_PROMPT.replace("{samples}", &samples_json);

        let raw = self
            .complete(GeminiRequest::new(prompt).temperature(0.1).json_output())
            .await?;
        let parsed: TitleResults = Self::parse_json_payload(&raw)?;

        let mut guesses = HashMap::new();
        for entry in parsed.results {
            guesses.insert(
                entry.idx,
                TitleGuess { title: entry.title, title_line_idx: entry.title_line_idx },
            );
        }

        if guesses.is_empty() {
            warn!("Title extraction returned no results");
        }

        Ok(guesses)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.complete(GeminiRequest::new("Hello").temperature(0.0)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripCodeFences_withJsonFence_shouldUnwrap() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_stripCodeFences_withoutFence_shouldPassThrough() {
        assert_eq!(strip_code_fences("  plain text "), "plain text");
    }

    #[test]
    fn test_parseJsonPayload_withMalformedJson_shouldError() {
        let result: Result<PatternDetection, _> = Gemini::parse_json_payload("not json at all");
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_parseJsonPayload_withDetection_shouldParse() {
        let raw = r##"{
            "is_multi_episode": true,
            "patterns": [{"separator_pattern": "#N화", "pattern_examples": ["#1화"], "pattern_regex": "^#(\\d+)화"}],
            "primary_pattern": "#N화",
            "estimated_episodes": 12,
            "confidence": 90,
            "special_episodes": {"prologue": "프롤로그", "epilogue": null, "extras": []},
            "language": "korean"
        }"##;
        let detection: PatternDetection = Gemini::parse_json_payload(raw).unwrap();
        assert!(detection.is_multi_episode);
        assert_eq!(detection.patterns.len(), 1);
        assert_eq!(detection.estimated_episodes, Some(12));
    }
}
