/*!
 * Unit tests for episode splitting through the public API
 */

use seriloc::app_config::SplitterConfig;
use seriloc::providers::mock::MockBackend;
use seriloc::providers::{PatternDetection, SpecialEpisodes, SuggestedPattern};
use seriloc::splitting::{clean_trailing_marker, EpisodeSplitter, SplitMethod};

use crate::common::{episode_body, marked_manuscript, total_content_chars};

fn splitter() -> EpisodeSplitter {
    EpisodeSplitter::new(SplitterConfig::default())
}

#[tokio::test]
async fn test_split_withKnownBoundaries_shouldReturnAllEpisodesWithoutLoss() {
    let count = 8;
    let text = marked_manuscript(count);
    let backend = MockBackend::working();

    let outcome = splitter().split(&text, "series.txt", &backend).await.unwrap();

    // Exactly K episodes, sequential numbering, high confidence
    assert_eq!(outcome.episodes.len(), count as usize);
    let numbers: Vec<u32> = outcome.episodes.iter().map(|e| e.number).collect();
    assert_eq!(numbers, (1..=count).collect::<Vec<_>>());
    assert!(outcome.confidence >= 95);

    // Zero content loss modulo separator lines: the separator lines are the
    // only characters unaccounted for
    let separator_chars: usize = (1..=count).map(|n| format!("#{}화", n).chars().count()).sum();
    let original_chars = text.chars().count();
    let kept = total_content_chars(&outcome.episodes);
    let lost = original_chars - kept - separator_chars;

    // Whitespace-only tolerance between episodes
    assert!(lost <= 3 * count as usize, "lost {} chars beyond separators", lost);
}

#[tokio::test]
async fn test_split_withNoRecognizablePattern_shouldBeSingleEpisodeIdempotent() {
    let text = "평범한 단편이다.\n어떤 구분자도 없다.\n그래서 한 편이다.";
    let backend = MockBackend::working();

    let outcome = splitter().split(text, "oneshot.txt", &backend).await.unwrap();

    assert_eq!(outcome.episodes.len(), 1);
    assert_eq!(outcome.episodes[0].content, text.trim());
    assert_eq!(outcome.confidence, 100);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_cleanTrailingMarker_withSceneBreakMarker_shouldStripIt() {
    let content = "...끝이었다.\n\n* * *$003";
    let cleaned = clean_trailing_marker(content);

    assert!(!cleaned.contains("* * *$003"));
    assert!(cleaned.ends_with("끝이었다."));
}

#[tokio::test]
async fn test_split_withBackendSuggestedPattern_shouldExecuteLocally() {
    // A separator format the catalog does not know: "~3~"
    let mut text = String::new();
    for n in 1..=4 {
        text.push_str(&format!("~{}~\n{}\n\n", n, episode_body(n)));
    }

    let detection = PatternDetection {
        is_multi_episode: true,
        patterns: vec![SuggestedPattern {
            separator_pattern: "~N~".to_string(),
            pattern_examples: vec!["~1~".to_string(), "~2~".to_string()],
            pattern_regex: r"^~(\d+)~\s*$".to_string(),
        }],
        primary_pattern: Some("~N~".to_string()),
        estimated_episodes: Some(4),
        confidence: 90,
        special_episodes: SpecialEpisodes::default(),
        language: Some("korean".to_string()),
    };
    let backend = MockBackend::working().with_detection(detection);

    let outcome = splitter().split(&text, "custom.txt", &backend).await.unwrap();

    assert_eq!(outcome.method, SplitMethod::Assisted);
    assert_eq!(outcome.episodes.len(), 4);
    assert_eq!(outcome.pattern_used, "~N~");
    assert_eq!(outcome.confidence, 90);
}

#[tokio::test]
async fn test_split_withMalformedBackendJson_shouldFallBackToSingle() {
    let text = "~1~\n본문이다.\n~2~\n더 많은 본문이다.";
    let backend = MockBackend::malformed_json();

    let outcome = splitter().split(text, "custom.txt", &backend).await.unwrap();

    // Malformed structured output falls back a tier instead of propagating
    assert_eq!(outcome.method, SplitMethod::Single);
    assert_eq!(outcome.episodes.len(), 1);
    assert_eq!(outcome.confidence, 100);
}

#[tokio::test]
async fn test_split_withEpilogueKeyword_shouldTitleLastEpisode() {
    let mut text = String::new();
    for n in 1..=2 {
        text.push_str(&format!("~{}~\n{}\n\n", n, episode_body(n)));
    }
    text.push_str(&format!("~3~\n에필로그\n{}\n", episode_body(3)));

    let detection = PatternDetection {
        is_multi_episode: true,
        patterns: vec![SuggestedPattern {
            separator_pattern: "~N~".to_string(),
            pattern_examples: vec!["~1~".to_string()],
            pattern_regex: r"^~(\d+)~\s*$".to_string(),
        }],
        primary_pattern: Some("~N~".to_string()),
        estimated_episodes: Some(3),
        confidence: 90,
        special_episodes: SpecialEpisodes::default(),
        language: Some("korean".to_string()),
    };
    let backend = MockBackend::working().with_detection(detection);

    let outcome = splitter().split(&text, "custom.txt", &backend).await.unwrap();

    assert_eq!(outcome.episodes.last().unwrap().title.as_deref(), Some("에필로그"));
}

#[tokio::test]
async fn test_split_withNumberingGap_shouldWarnButNotFail() {
    let mut text = String::new();
    for n in [1u32, 2, 9, 10] {
        text.push_str(&format!("#{}화\n{}\n\n", n, episode_body(n)));
    }
    let backend = MockBackend::working();

    let outcome = splitter().split(&text, "gappy.txt", &backend).await.unwrap();

    assert_eq!(outcome.episodes.len(), 4);
    assert!(outcome.warnings.iter().any(|w| w.contains("gap")));
    assert!(outcome.confidence >= 70);
}
