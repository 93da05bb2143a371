/*!
 * Tiered episode-separator detection.
 *
 * Detection runs cheapest-first:
 * 1. Direct scan of the known-pattern catalog over every line
 * 2. Combined-pattern merge when two marker variants co-occur
 * 3. Backend-assisted detection on a bounded manuscript sample
 *
 * The only terminal failure is "no separators at all", which is not a
 * failure: the manuscript is a single episode.
 */

use std::collections::HashSet;

use log::{info, warn};

use crate::app_config::SplitterConfig;
use crate::providers::{Backend, PatternDetection, SpecialEpisodes};
use crate::splitting::catalog::{
    COMBINABLE_PAIR, MatchKind, PatternCatalog, SeparatorPattern,
};

/// Confidence assigned to direct catalog detection
const DIRECT_CONFIDENCE: u8 = 95;

/// Confidence assigned to the single-episode terminal state
const SINGLE_CONFIDENCE: u8 = 100;

/// How a split plan was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMethod {
    /// No separators; whole text is one episode
    Single,
    /// Cataloged pattern accepted directly
    Direct,
    /// Inline marker interpretation preferred over line-start patterns
    Inline,
    /// Backend-suggested patterns executed locally
    Assisted,
}

impl SplitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Direct => "direct",
            Self::Inline => "inline",
            Self::Assisted => "assisted",
        }
    }
}

/// Match statistics for one cataloged pattern against a manuscript
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Symbolic pattern name
    pub pattern_name: String,

    /// Number of lines the pattern matched
    pub match_count: usize,

    /// Sample matched strings, at most 5
    pub examples: Vec<String>,
}

/// An executable splitting plan produced by detection
#[derive(Debug, Clone)]
pub struct SplitPlan {
    /// How the plan was produced
    pub method: SplitMethod,

    /// Compiled separator patterns to execute (empty for Single/Inline)
    pub patterns: Vec<SeparatorPattern>,

    /// Name of the dominant pattern, for reporting
    pub primary_pattern: String,

    /// Episode count the detection tier predicted
    pub estimated_episodes: Option<usize>,

    /// Plan confidence, 0-100
    pub confidence: u8,

    /// Prologue/epilogue/extra keyword hints
    pub special_episodes: SpecialEpisodes,

    /// Detected manuscript language, when the backend reported one
    pub language: Option<String>,
}

impl SplitPlan {
    /// The terminal single-episode plan
    pub fn single() -> Self {
        Self {
            method: SplitMethod::Single,
            patterns: Vec::new(),
            primary_pattern: "none".to_string(),
            estimated_episodes: Some(1),
            confidence: SINGLE_CONFIDENCE,
            special_episodes: SpecialEpisodes::default(),
            language: None,
        }
    }
}

/// Tiered separator-pattern detector
#[derive(Debug)]
pub struct PatternDetector {
    catalog: PatternCatalog,
    config: SplitterConfig,
}

impl PatternDetector {
    pub fn new(config: SplitterConfig) -> Self {
        Self { catalog: PatternCatalog::standard(), config }
    }

    pub fn with_catalog(catalog: PatternCatalog, config: SplitterConfig) -> Self {
        Self { catalog, config }
    }

    /// Count matches of every cataloged line-start pattern
    pub fn scan(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for pattern in self.catalog.line_patterns() {
            let mut count = 0;
            let mut examples = Vec::new();

            for line in text.lines() {
                let line = line.trim().trim_start_matches('\u{feff}');
                if let Some(caps) = pattern.regex.captures(line) {
                    count += 1;
                    if examples.len() < 5 {
                        examples.push(caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default());
                    }
                }
            }

            if count > 0 {
                matches.push(PatternMatch {
                    pattern_name: pattern.name.clone(),
                    match_count: count,
                    examples,
                });
            }
        }

        matches
    }

    /// Tier 1 and 2: direct catalog detection, no backend involved.
    ///
    /// Returns None when no cataloged pattern clears the acceptance
    /// threshold and detection must escalate.
    pub fn detect_direct(&self, text: &str) -> Option<SplitPlan> {
        let line_matches = self.scan(text);

        let (bare_name, decorated_name) = COMBINABLE_PAIR;
        let bare_count = count_for(&line_matches, bare_name);
        let decorated_count = count_for(&line_matches, decorated_name);
        let combined_count = if self.config.detect_combined && bare_count > 0 && decorated_count > 0 {
            bare_count + decorated_count
        } else {
            0
        };

        let max_line_count = line_matches
            .iter()
            .map(|m| m.match_count)
            .max()
            .unwrap_or(0)
            .max(combined_count);

        // Inline interpretation: $NNN markers appearing mid-line. Preferred
        // when clearly more episodes surface that way than via line starts.
        let inline = self.catalog.inline_pattern();
        let unique_inline: HashSet<u32> = inline
            .regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
            .collect();
        let inline_count = unique_inline.len();

        if inline_count > 0
            && inline_count as f64 > max_line_count as f64 * self.config.inline_preference_ratio
        {
            info!(
                "Detected inline $NNN pattern with {} episodes (vs {} line-start)",
                inline_count, max_line_count
            );
            return Some(SplitPlan {
                method: SplitMethod::Inline,
                patterns: Vec::new(),
                primary_pattern: inline.name.clone(),
                estimated_episodes: Some(inline_count),
                confidence: DIRECT_CONFIDENCE,
                special_episodes: SpecialEpisodes::default(),
                language: None,
            });
        }

        if line_matches.is_empty() {
            return None;
        }

        // Combined pattern: manuscripts often mix a bare marker with a
        // scene-break-decorated variant of the same marker
        if combined_count > 0 {
            info!(
                "Detected combined pattern: {} ({}) + {} ({})",
                bare_name, bare_count, decorated_name, decorated_count
            );
            let combined = self.catalog.combined();
            return Some(SplitPlan {
                method: SplitMethod::Direct,
                primary_pattern: combined.name.clone(),
                patterns: vec![combined],
                estimated_episodes: Some(combined_count),
                special_episodes: SpecialEpisodes::default(),
                confidence: DIRECT_CONFIDENCE,
                language: None,
            });
        }

        // Best single pattern, if it clears the direct-accept threshold
        let best = line_matches.iter().max_by_key(|m| m.match_count)?;
        if best.match_count < self.config.min_direct_matches {
            return None;
        }

        info!("Detected pattern '{}' with {} matches", best.pattern_name, best.match_count);

        let pattern = self.catalog.find(&best.pattern_name)?.clone();
        Some(SplitPlan {
            method: SplitMethod::Direct,
            primary_pattern: pattern.name.clone(),
            patterns: vec![pattern],
            estimated_episodes: Some(best.match_count),
            confidence: DIRECT_CONFIDENCE,
            special_episodes: SpecialEpisodes::default(),
            language: None,
        })
    }

    /// Full tiered detection, escalating to the backend when the catalog
    /// comes up empty
    pub async fn detect(&self, text: &str, filename: &str, backend: &dyn Backend) -> SplitPlan {
        if let Some(plan) = self.detect_direct(text) {
            return plan;
        }

        let sample: String = text
            .lines()
            .take(self.config.sample_lines)
            .collect::<Vec<_>>()
            .join("\n");

        match backend.detect_pattern(&sample, filename, self.config.sample_lines).await {
            Ok(detection) => self.plan_from_detection(detection),
            Err(e) => {
                // Malformed JSON or API failure: fall back a tier. With no
                // partial pattern info to execute, that tier is single-episode.
                warn!("Backend pattern detection failed: {}", e);
                SplitPlan::single()
            }
        }
    }

    /// Convert a backend detection result into an executable plan
    fn plan_from_detection(&self, detection: PatternDetection) -> SplitPlan {
        if !detection.is_multi_episode {
            return SplitPlan::single();
        }

        let mut suggested = detection.patterns;

        // A bare standalone-number pattern is too generic to trust when a
        // specific marker pattern was also found; it fires on dialogue
        let has_specific = suggested.iter().any(|p| {
            let name = p.separator_pattern.as_str();
            name.starts_with('$')
                || name.starts_with('#')
                || name.starts_with("//")
                || name.contains('화')
                || name.contains('話')
                || name.contains("Chapter")
                || name.contains("Episode")
        });
        if has_specific {
            let before = suggested.len();
            suggested.retain(|p| p.pattern_regex != r"^(\d+)$" && p.separator_pattern != "N");
            if suggested.len() < before {
                info!(
                    "Filtered {} generic number pattern(s) from backend suggestion",
                    before - suggested.len()
                );
            }
        }

        let mut compiled = Vec::new();
        for p in &suggested {
            match SeparatorPattern::new(&p.separator_pattern, &p.pattern_regex, MatchKind::LineStart) {
                Ok(pattern) => compiled.push(pattern),
                Err(e) => warn!("Dropping backend-suggested pattern: {}", e),
            }
        }

        if compiled.is_empty() {
            warn!("No backend-suggested pattern compiled, treating as single episode");
            return SplitPlan::single();
        }

        let primary = detection
            .primary_pattern
            .unwrap_or_else(|| compiled[0].name.clone());

        SplitPlan {
            method: SplitMethod::Assisted,
            patterns: compiled,
            primary_pattern: primary,
            estimated_episodes: detection.estimated_episodes,
            confidence: detection.confidence.min(100),
            special_episodes: detection.special_episodes,
            language: detection.language,
        }
    }
}

fn count_for(matches: &[PatternMatch], name: &str) -> usize {
    matches
        .iter()
        .find(|m| m.pattern_name == name)
        .map(|m| m.match_count)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SuggestedPattern;

    fn detector() -> PatternDetector {
        PatternDetector::new(SplitterConfig::default())
    }

    fn manuscript(marker: impl Fn(u32) -> String, count: u32) -> String {
        let mut text = String::new();
        for n in 1..=count {
            text.push_str(&marker(n));
            text.push('\n');
            text.push_str(&format!("{}편의 본문이 여기 있다.\n\n", n));
        }
        text
    }

    #[test]
    fn test_detectDirect_withHashPattern_shouldAcceptAt95() {
        let text = manuscript(|n| format!("#{}화", n), 5);
        let plan = detector().detect_direct(&text).unwrap();

        assert_eq!(plan.method, SplitMethod::Direct);
        assert_eq!(plan.primary_pattern, "#N화");
        assert_eq!(plan.confidence, 95);
        assert_eq!(plan.estimated_episodes, Some(5));
    }

    #[test]
    fn test_detectDirect_withTwoMatches_shouldEscalate() {
        let text = manuscript(|n| format!("#{}화", n), 2);
        assert!(detector().detect_direct(&text).is_none());
    }

    #[test]
    fn test_detectDirect_withInlineMarkers_shouldPreferInline() {
        // Markers fused mid-line: no line-start pattern will see them
        let mut text = String::from("서장의 본문.\n");
        for n in 1..=6 {
            text.push_str(&format!("\"말했다.\"$00{}그리고 다음 이야기가 이어졌다.\n", n));
        }

        let plan = detector().detect_direct(&text).unwrap();
        assert_eq!(plan.method, SplitMethod::Inline);
        assert_eq!(plan.estimated_episodes, Some(6));
    }

    #[test]
    fn test_detectDirect_withMixedMarkers_shouldCombine() {
        let mut text = String::new();
        for n in 1..=3 {
            text.push_str(&format!("$00{}\n{}편 본문.\n", n, n));
        }
        for n in 4..=6 {
            text.push_str(&format!("* * *$00{}\n{}편 본문.\n", n, n));
        }

        let plan = detector().detect_direct(&text).unwrap();
        assert_eq!(plan.primary_pattern, "$NNN+* * *$NNN");
        assert_eq!(plan.estimated_episodes, Some(6));
    }

    #[test]
    fn test_detectDirect_withCombinedDisabled_shouldFallBackToBest() {
        let mut text = String::new();
        for n in 1..=4 {
            text.push_str(&format!("$00{}\n{}편 본문.\n", n, n));
        }
        for n in 5..=6 {
            text.push_str(&format!("* * *$00{}\n{}편 본문.\n", n, n));
        }

        let config = SplitterConfig { detect_combined: false, ..SplitterConfig::default() };
        let plan = PatternDetector::new(config).detect_direct(&text).unwrap();

        assert_eq!(plan.primary_pattern, "$NNN");
    }

    #[test]
    fn test_planFromDetection_shouldFilterGenericNumberPattern() {
        let detection = PatternDetection {
            is_multi_episode: true,
            patterns: vec![
                SuggestedPattern {
                    separator_pattern: "$NNN".to_string(),
                    pattern_examples: vec!["$001".to_string()],
                    pattern_regex: r"^\$(\d{3})".to_string(),
                },
                SuggestedPattern {
                    separator_pattern: "N".to_string(),
                    pattern_examples: vec!["1".to_string()],
                    pattern_regex: r"^(\d+)$".to_string(),
                },
            ],
            primary_pattern: Some("$NNN".to_string()),
            estimated_episodes: Some(10),
            confidence: 90,
            special_episodes: SpecialEpisodes::default(),
            language: Some("korean".to_string()),
        };

        let plan = detector().plan_from_detection(detection);
        assert_eq!(plan.patterns.len(), 1);
        assert_eq!(plan.patterns[0].name, "$NNN");
    }

    #[test]
    fn test_planFromDetection_withNoCompilablePattern_shouldGoSingle() {
        let detection = PatternDetection {
            is_multi_episode: true,
            patterns: vec![SuggestedPattern {
                separator_pattern: "broken".to_string(),
                pattern_examples: vec![],
                pattern_regex: "^#\\d+화$".to_string(), // no capture group
            }],
            primary_pattern: None,
            estimated_episodes: None,
            confidence: 80,
            special_episodes: SpecialEpisodes::default(),
            language: None,
        };

        let plan = detector().plan_from_detection(detection);
        assert_eq!(plan.method, SplitMethod::Single);
        assert_eq!(plan.confidence, 100);
    }
}
