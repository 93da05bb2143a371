/*!
 * Post-split validation and confidence scoring.
 *
 * Four sanity checks run after every split, each deducting a named penalty
 * from a starting confidence of 100. The score is floored so minor heuristic
 * noise never reads as total failure.
 */

use crate::splitting::splitter::Episode;

/// Scoring policy for split validation.
///
/// Penalties and floors are explicit fields so the policy is visible and
/// testable independently of the scan logic.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Deducted when actual vs estimated episode count differs by more than
    /// `count_mismatch_tolerance_pct`
    pub count_mismatch_penalty: u8,

    /// Relative difference (percent) tolerated before the count penalty
    pub count_mismatch_tolerance_pct: f64,

    /// Deducted once per numbering gap larger than `max_numbering_gap`
    pub numbering_gap_penalty: u8,

    /// Largest benign gap between consecutive episode numbers
    pub max_numbering_gap: u32,

    /// Deducted when too many episodes fall under `short_episode_words`
    pub short_episode_penalty: u8,

    /// Word count below which an episode counts as suspiciously short
    pub short_episode_words: usize,

    /// Fraction of short episodes tolerated before the penalty
    pub short_episode_tolerance: f64,

    /// Deducted when the split preserved less than `min_preserved_pct` of
    /// the original characters
    pub content_loss_penalty: u8,

    /// Minimum preserved character percentage
    pub min_preserved_pct: f64,

    /// Reported confidence never drops below this floor
    pub min_confidence: u8,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            count_mismatch_penalty: 10,
            count_mismatch_tolerance_pct: 20.0,
            numbering_gap_penalty: 5,
            max_numbering_gap: 2,
            short_episode_penalty: 5,
            short_episode_words: 20,
            short_episode_tolerance: 0.1,
            content_loss_penalty: 10,
            min_preserved_pct: 80.0,
            min_confidence: 70,
        }
    }
}

/// Outcome of split validation
#[derive(Debug, Clone)]
pub struct SplitValidation {
    /// Confidence after penalties, floored at the policy minimum
    pub confidence: u8,

    /// One human-readable warning per failed check occurrence
    pub warnings: Vec<String>,
}

impl ScoringPolicy {
    /// Validate a split result against the original text.
    ///
    /// `estimated` is the episode count the detection tier predicted, when
    /// one was available.
    pub fn validate(
        &self,
        episodes: &[Episode],
        estimated: Option<usize>,
        original_text: &str,
    ) -> SplitValidation {
        let mut warnings = Vec::new();
        let mut confidence: i32 = 100;

        // Check 1: episode count vs estimate
        if let Some(estimated) = estimated {
            if estimated > 0 {
                let actual = episodes.len();
                let diff_pct =
                    (actual as f64 - estimated as f64).abs() / estimated as f64 * 100.0;
                if diff_pct > self.count_mismatch_tolerance_pct {
                    warnings.push(format!(
                        "Episode count mismatch: estimated {}, found {} ({:.1}% difference)",
                        estimated, actual, diff_pct
                    ));
                    confidence -= i32::from(self.count_mismatch_penalty);
                }
            }
        }

        // Check 2: numbering gaps
        for pair in episodes.windows(2) {
            let gap = pair[1].number.saturating_sub(pair[0].number);
            if gap > self.max_numbering_gap {
                warnings.push(format!(
                    "Large gap in numbering: {} → {}",
                    pair[0].number, pair[1].number
                ));
                confidence -= i32::from(self.numbering_gap_penalty);
            }
        }

        // Check 3: suspiciously short episodes
        let very_short = episodes
            .iter()
            .filter(|ep| ep.content.split_whitespace().count() < self.short_episode_words)
            .count();
        if !episodes.is_empty()
            && very_short as f64 > episodes.len() as f64 * self.short_episode_tolerance
        {
            warnings.push(format!(
                "{} episodes have very short content (<{} words)",
                very_short, self.short_episode_words
            ));
            confidence -= i32::from(self.short_episode_penalty);
        }

        // Check 4: total content preservation
        let original_chars = original_text.chars().count();
        if original_chars > 0 {
            let kept_chars: usize = episodes.iter().map(|ep| ep.content.chars().count()).sum();
            let preserved_pct = kept_chars as f64 / original_chars as f64 * 100.0;
            if preserved_pct < self.min_preserved_pct {
                warnings.push(format!(
                    "Content loss detected: {:.1}% of text missing",
                    100.0 - preserved_pct
                ));
                confidence -= i32::from(self.content_loss_penalty);
            }
        }

        SplitValidation {
            confidence: confidence.max(i32::from(self.min_confidence)) as u8,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(number: u32, content: &str) -> Episode {
        Episode { number, title: None, content: content.to_string() }
    }

    fn long_body() -> String {
        "단어 ".repeat(40).trim_end().to_string()
    }

    #[test]
    fn test_validate_withCleanSplit_shouldScore100() {
        let body = long_body();
        let episodes = vec![episode(1, &body), episode(2, &body), episode(3, &body)];
        let original = format!("$001{}\n$002{}\n$003{}", body, body, body);

        let result = ScoringPolicy::default().validate(&episodes, Some(3), &original);

        assert_eq!(result.confidence, 100);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_withCountMismatch_shouldDeduct() {
        let body = long_body();
        let episodes = vec![episode(1, &body), episode(2, &body)];

        let result = ScoringPolicy::default().validate(&episodes, Some(10), &body.repeat(2));

        assert_eq!(result.confidence, 90);
        assert!(result.warnings.iter().any(|w| w.contains("count mismatch")));
    }

    #[test]
    fn test_validate_withNumberingGap_shouldDeductPerGap() {
        let body = long_body();
        let episodes = vec![episode(1, &body), episode(7, &body), episode(15, &body)];

        let result = ScoringPolicy::default().validate(&episodes, Some(3), &body.repeat(3));

        // Two gaps over the threshold
        assert_eq!(result.confidence, 90);
        assert_eq!(
            result.warnings.iter().filter(|w| w.contains("gap in numbering")).count(),
            2
        );
    }

    #[test]
    fn test_validate_shouldFloorConfidence() {
        // Everything wrong at once: count mismatch, gaps, short bodies,
        // massive content loss
        let episodes = vec![episode(1, "짧다"), episode(50, "짧다"), episode(99, "짧다")];
        let original = "원".repeat(10_000);

        let result = ScoringPolicy::default().validate(&episodes, Some(100), &original);

        assert_eq!(result.confidence, 70);
        assert!(result.warnings.len() >= 4);
    }

    #[test]
    fn test_validate_withContentLoss_shouldWarn() {
        let body = long_body();
        let episodes = vec![episode(1, &body)];
        let original = format!("{}{}", body, "잃어버린 내용 ".repeat(100));

        let result = ScoringPolicy::default().validate(&episodes, Some(1), &original);

        assert!(result.warnings.iter().any(|w| w.contains("Content loss")));
        assert_eq!(result.confidence, 90);
    }
}
