/*!
 * Episode splitting execution.
 *
 * Takes the plan chosen by the detector and carves the manuscript into
 * episodes: line-based splitting for line-start patterns, text-offset
 * splitting for inline markers, trailing-marker cleanup, empty-episode
 * filtering, batched title extraction, and validation scoring.
 */

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::SplitterConfig;
use crate::errors::SplitError;
use crate::language_utils::Lang;
use crate::providers::{Backend, TitleSample};
use crate::splitting::catalog::{clean_trailing_marker, SeparatorPattern};
use crate::splitting::detector::{PatternDetector, SplitMethod, SplitPlan};
use crate::splitting::scoring::ScoringPolicy;

/// One serialized narrative unit extracted from a manuscript.
///
/// Episodes are immutable once emitted downstream; later pipeline stages
/// produce new copies rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode number; 0 is reserved for a prologue
    pub number: u32,

    /// Episode title, when one was present or extracted
    pub title: Option<String>,

    /// Text body
    pub content: String,
}

/// Result of splitting one manuscript
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Episodes in source order
    pub episodes: Vec<Episode>,

    /// Final confidence, 0-100
    pub confidence: u8,

    /// Validation warnings
    pub warnings: Vec<String>,

    /// How the split was performed
    pub method: SplitMethod,

    /// Name of the pattern that governed the split
    pub pattern_used: String,

    /// Detected manuscript language, when known
    pub language: Option<String>,
}

/// Inline split marker: optional scene break fused with a $NNN marker
static INLINE_SPLIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\* \* \*)?\$(\d{3})").expect("Invalid inline split regex")
});

/// Scene-break artifact left at the end of inline-split content
static TRAILING_SCENE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\* \* \*\s*$").expect("Invalid scene break regex")
});

/// Pattern-driven episode splitter
#[derive(Debug)]
pub struct EpisodeSplitter {
    detector: PatternDetector,
    scoring: ScoringPolicy,
}

impl EpisodeSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            detector: PatternDetector::new(config),
            scoring: ScoringPolicy::default(),
        }
    }

    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }

    /// Split a manuscript into episodes.
    ///
    /// Detection escalates through the catalog to the backend; execution is
    /// always local. Producing zero episodes is never an error: the text
    /// degrades to a single episode at full confidence.
    pub async fn split(
        &self,
        text: &str,
        filename: &str,
        backend: &dyn Backend,
    ) -> Result<SplitOutcome, SplitError> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(SplitError::EmptyInput);
        }

        let plan = self.detector.detect(text, filename, backend).await;

        if plan.method == SplitMethod::Single {
            return Ok(Self::single_outcome(text));
        }

        info!("Splitting with method '{}' (pattern: {})", plan.method.as_str(), plan.primary_pattern);

        let mut episodes = match plan.method {
            SplitMethod::Inline => split_inline(text),
            _ => split_by_lines(text, &plan.patterns),
        };

        // Back-to-back separators leave empty episodes behind
        let before = episodes.len();
        episodes.retain(|ep| !ep.content.trim().is_empty());
        if episodes.len() < before {
            info!("Filtered out {} empty episodes from consecutive separators", before - episodes.len());
        }

        if episodes.is_empty() {
            warn!("Split found no episodes, treating as single episode");
            return Ok(Self::single_outcome(text));
        }

        apply_special_episode_hints(&mut episodes, &plan);
        self.extract_titles(&mut episodes, backend).await;

        let validation = self.scoring.validate(&episodes, plan.estimated_episodes, text);
        let confidence = plan.confidence.min(validation.confidence);

        Ok(SplitOutcome {
            episodes,
            confidence,
            warnings: validation.warnings,
            method: plan.method,
            pattern_used: plan.primary_pattern,
            language: plan.language,
        })
    }

    /// The terminal state for manuscripts without separators
    fn single_outcome(text: &str) -> SplitOutcome {
        SplitOutcome {
            episodes: vec![Episode {
                number: 1,
                title: None,
                content: text.trim().to_string(),
            }],
            confidence: 100,
            warnings: Vec::new(),
            method: SplitMethod::Single,
            pattern_used: "none".to_string(),
            language: None,
        }
    }

    /// Batched backend title extraction for episodes lacking a title
    async fn extract_titles(&self, episodes: &mut [Episode], backend: &dyn Backend) {
        let samples: Vec<TitleSample> = episodes
            .iter()
            .enumerate()
            .filter(|(_, ep)| ep.title.is_none() && !ep.content.trim().is_empty())
            .map(|(idx, ep)| TitleSample {
                idx,
                number: ep.number,
                first_lines: ep
                    .content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .take(3)
                    .map(String::from)
                    .collect(),
            })
            .collect();

        if samples.is_empty() {
            return;
        }

        match backend.extract_episode_titles(&samples).await {
            Ok(guesses) => {
                for (idx, guess) in guesses {
                    let (Some(title), Some(line_idx)) = (guess.title, guess.title_line_idx) else {
                        continue;
                    };
                    if let Some(ep) = episodes.get_mut(idx) {
                        promote_title_line(ep, &title, line_idx);
                    }
                }
            }
            Err(e) => {
                warn!("Title extraction failed: {}, episodes will have no titles", e);
            }
        }
    }
}

/// Split at line-start separator matches, trying each pattern per line
fn split_by_lines(text: &str, patterns: &[SeparatorPattern]) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut current_number: Option<u32> = None;
    let mut current_content: Vec<&str> = Vec::new();

    let flush = |number: Option<u32>, content: &mut Vec<&str>, episodes: &mut Vec<Episode>| {
        if let Some(number) = number {
            let raw = content.join("\n").trim().to_string();
            episodes.push(Episode {
                number,
                title: None,
                content: clean_trailing_marker(&raw),
            });
        }
        content.clear();
    };

    for line in text.lines() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');
        let mut matched = false;

        for pattern in patterns {
            if let Some((number, match_end)) = pattern.match_line(trimmed) {
                flush(current_number, &mut current_content, &mut episodes);
                current_number = Some(number);

                // Text following the separator on the same line belongs to
                // the NEW episode, not the old one
                let remaining = trimmed[match_end..].trim();
                if !remaining.is_empty() {
                    current_content.push(remaining);
                }

                matched = true;
                break;
            }
        }

        if !matched && current_number.is_some() {
            current_content.push(line);
        }
    }

    flush(current_number, &mut current_content, &mut episodes);
    episodes
}

/// Split at inline $NNN markers by text offset rather than by line.
///
/// Handles markers fused into running text, like `"말했다."$002엄마가...`
/// and `* * *$003이영이...`.
fn split_inline(text: &str) -> Vec<Episode> {
    let markers: Vec<(u32, usize)> = INLINE_SPLIT_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((number, whole.end()))
        })
        .collect();

    if markers.is_empty() {
        return Vec::new();
    }

    info!("Found {} inline $NNN markers", markers.len());

    let starts: Vec<usize> = INLINE_SPLIT_REGEX
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    let mut episodes = Vec::new();
    for (i, &(number, content_start)) in markers.iter().enumerate() {
        let content_end = match starts.get(i + 1) {
            Some(&next_start) => {
                // A scene break sitting right before the next marker is part
                // of the boundary, not of this episode's content
                let between = &text[content_start..next_start];
                match between.rfind("* * *") {
                    Some(pos) if between[pos + 5..].trim().is_empty() => content_start + pos,
                    _ => next_start,
                }
            }
            None => text.len(),
        };

        let mut content = text[content_start..content_end].trim().to_string();
        content = clean_trailing_marker(&content);
        content = TRAILING_SCENE_BREAK.replace(&content, "").trim().to_string();

        episodes.push(Episode { number, title: None, content });
    }

    episodes
}

/// Apply epilogue keyword hints to the last episode's title.
///
/// Detection-provided hints win; otherwise the detected language's stock
/// epilogue keywords are tried.
fn apply_special_episode_hints(episodes: &mut [Episode], plan: &SplitPlan) {
    let Some(last) = episodes.last_mut() else {
        return;
    };

    let mut keywords: Vec<String> = Vec::new();
    if let Some(keyword) = &plan.special_episodes.epilogue {
        keywords.push(keyword.clone());
    } else if let Some(lang) = plan.language.as_deref().and_then(|l| l.parse::<Lang>().ok()) {
        keywords.extend(
            lang.special_episode_keywords().epilogue.iter().map(|k| k.to_string()),
        );
    }

    let head: String = last.content.chars().take(100).collect::<String>().to_lowercase();
    for keyword in keywords {
        if head.contains(&keyword.to_lowercase()) {
            last.title = Some(keyword);
            break;
        }
    }
}

/// Promote an embedded title line out of episode content
fn promote_title_line(episode: &mut Episode, title: &str, title_line_idx: usize) {
    let mut lines: Vec<String> = episode.content.lines().map(String::from).collect();

    let mut non_empty_seen = 0;
    for line in lines.iter_mut() {
        if !line.trim().is_empty() {
            if non_empty_seen == title_line_idx {
                line.clear();
                break;
            }
            non_empty_seen += 1;
        }
    }

    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }

    episode.title = Some(title.to_string());
    episode.content = lines.join("\n").trim().to_string();
    info!("Extracted title for episode {}: {}", episode.number, title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockBackend;

    fn splitter() -> EpisodeSplitter {
        EpisodeSplitter::new(SplitterConfig::default())
    }

    fn body(n: u32) -> String {
        format!("{}편의 본문이 시작된다. ", n).repeat(10).trim_end().to_string()
    }

    #[tokio::test]
    async fn test_split_withMarkedBoundaries_shouldPreserveAllEpisodes() {
        let mut text = String::new();
        for n in 1..=4 {
            text.push_str(&format!("#{}화\n{}\n\n", n, body(n)));
        }

        let backend = MockBackend::working();
        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        assert_eq!(outcome.episodes.len(), 4);
        assert_eq!(
            outcome.episodes.iter().map(|e| e.number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(outcome.confidence >= 95);

        // No content loss: every body survives intact
        for n in 1..=4u32 {
            assert_eq!(outcome.episodes[(n - 1) as usize].content, body(n));
        }
        // Direct detection never touches the backend
        assert_eq!(backend.calls(), 1); // title extraction only
    }

    #[tokio::test]
    async fn test_split_withoutSeparators_shouldReturnSingleEpisodeAt100() {
        let text = "그저 평범한 단편 소설이다.\n마커는 어디에도 없다.\n";
        let backend = MockBackend::working();

        let outcome = splitter().split(text, "short.txt", &backend).await.unwrap();

        assert_eq!(outcome.episodes.len(), 1);
        assert_eq!(outcome.confidence, 100);
        assert_eq!(outcome.method, SplitMethod::Single);
        assert_eq!(outcome.episodes[0].content, text.trim());
    }

    #[tokio::test]
    async fn test_split_withTrailingMarker_shouldStripItFromPreviousEpisode() {
        let text = format!(
            "$001{}\n모든 것의 끝이었다.\n\n* * *$003{}",
            body(1),
            body(3)
        );
        let backend = MockBackend::working();

        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        let first = &outcome.episodes[0];
        assert!(!first.content.contains("* * *$003"));
        assert!(first.content.ends_with("끝이었다."));
    }

    #[tokio::test]
    async fn test_split_withTextAfterSeparator_shouldAttachToNewEpisode() {
        let text = format!(
            "$001본문 첫 줄.\n{}\n$002다음 화 첫 줄.\n{}\n$003마지막 화 첫 줄.\n{}",
            body(1),
            body(2),
            body(3)
        );
        let backend = MockBackend::working();

        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        assert_eq!(outcome.episodes.len(), 3);
        assert!(outcome.episodes[0].content.starts_with("본문 첫 줄."));
        assert!(outcome.episodes[1].content.starts_with("다음 화 첫 줄."));
        assert!(outcome.episodes[2].content.starts_with("마지막 화 첫 줄."));
    }

    #[tokio::test]
    async fn test_split_withConsecutiveSeparators_shouldDropEmptyEpisode() {
        let text = format!("#1화\n#2화\n{}\n#3화\n{}", body(2), body(3));
        let backend = MockBackend::working();

        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        let numbers: Vec<u32> = outcome.episodes.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_split_withInlineMarkers_shouldSplitMidLine() {
        let text = format!(
            "\"끝났어.\"$001{}\"다시 시작이야.\"$002{}",
            body(1),
            body(2)
        );
        let backend = MockBackend::working();

        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        assert_eq!(outcome.episodes.len(), 2);
        assert_eq!(outcome.method, SplitMethod::Inline);
        assert!(outcome.episodes[0].content.starts_with("1편의 본문"));
    }

    #[tokio::test]
    async fn test_split_withTitleGuess_shouldPromoteTitleLine() {
        let mut text = String::new();
        for n in 1..=3 {
            text.push_str(&format!("#{}화\n{}화 - 어떤 제목\n{}\n\n", n, n, body(n)));
        }

        let backend = MockBackend::working().with_title(0, "어떤 제목", 0);
        let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

        let first = &outcome.episodes[0];
        assert_eq!(first.title.as_deref(), Some("어떤 제목"));
        assert!(!first.content.contains("어떤 제목"));
        // Untouched episodes keep their content intact
        assert!(outcome.episodes[1].content.contains("어떤 제목"));
    }

    #[tokio::test]
    async fn test_split_withEmptyInput_shouldError() {
        let backend = MockBackend::working();
        let result = splitter().split("   \n  ", "empty.txt", &backend).await;
        assert!(matches!(result, Err(SplitError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_split_withFailingBackend_shouldDegradeToSingle() {
        // Unrecognizable separators, backend down: the whole text is one
        // episode and that is not an error
        let text = "~~ 1 ~~\n본문.\n~~ 2 ~~\n본문.\n";
        let backend = MockBackend::failing();

        let outcome = splitter().split(text, "weird.txt", &backend).await.unwrap();

        assert_eq!(outcome.episodes.len(), 1);
        assert_eq!(outcome.confidence, 100);
    }
}
