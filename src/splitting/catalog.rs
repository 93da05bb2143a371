/*!
 * Catalog of known episode-separator patterns.
 *
 * Each pattern is a typed record built through a validating constructor:
 * the regex must compile and must contain exactly one capturing group (for
 * the episode number), so a malformed pattern is rejected at construction
 * rather than discovered mid-split.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SplitError;

/// Where a separator pattern is expected to match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Anchored at the start of a (trimmed) line
    LineStart,
    /// Anywhere in running text, including mid-line
    Inline,
}

/// A compiled, validated episode-separator pattern
#[derive(Debug, Clone)]
pub struct SeparatorPattern {
    /// Symbolic pattern name, e.g. "#N화" or "$NNN"
    pub name: String,

    /// Compiled matcher with one capturing group for the episode number
    pub regex: Regex,

    /// Match position class
    pub kind: MatchKind,
}

impl SeparatorPattern {
    /// Build a pattern, rejecting regexes without exactly one capturing group
    pub fn new(name: &str, regex_src: &str, kind: MatchKind) -> Result<Self, SplitError> {
        let regex = Regex::new(regex_src).map_err(|e| SplitError::InvalidPattern {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        // captures_len counts the implicit whole-match group as group 0
        if regex.captures_len() != 2 {
            return Err(SplitError::InvalidPattern {
                name: name.to_string(),
                reason: format!(
                    "expected exactly one capturing group for the episode number, found {}",
                    regex.captures_len() - 1
                ),
            });
        }

        Ok(Self { name: name.to_string(), regex, kind })
    }

    /// Try to match a trimmed line and extract the episode number.
    ///
    /// Returns the captured number and the byte offset where the match ends,
    /// so the caller can attach any trailing text to the new episode.
    pub fn match_line(&self, line: &str) -> Option<(u32, usize)> {
        let caps = self.regex.captures(line)?;
        let whole = caps.get(0)?;

        // Line-start patterns are ^-anchored, but double-check the position
        // so a suggested pattern missing its anchor cannot split mid-line
        if self.kind == MatchKind::LineStart && whole.start() != 0 {
            return None;
        }

        let number = match caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            Some(n) => n,
            // Capturing group exists by construction, so this only happens on
            // numeric overflow; scavenge digits from the whole match instead
            None => scavenge_number(whole.as_str())?,
        };

        Some((number, whole.end()))
    }
}

/// Last-resort digit extraction from a matched separator string
fn scavenge_number(matched: &str) -> Option<u32> {
    let digits: String = matched.chars().filter(|c| c.is_ascii_digit()).take(6).collect();
    digits.parse().ok()
}

/// The fixed set of known separator patterns
#[derive(Debug)]
pub struct PatternCatalog {
    patterns: Vec<SeparatorPattern>,
    inline: SeparatorPattern,
}

/// Names of the component patterns the detector may merge into one
pub const COMBINABLE_PAIR: (&str, &str) = ("$NNN", "* * *$NNN");

/// Name and regex of the merged variant of [`COMBINABLE_PAIR`]
pub const COMBINED_NAME: &str = "$NNN+* * *$NNN";
pub const COMBINED_REGEX: &str = r"^(?:\* \* \*)?\$(\d{3})";

impl PatternCatalog {
    /// Catalog of the separator formats observed across real manuscripts
    pub fn standard() -> Self {
        // Construction is infallible for these vetted sources; a bad entry
        // here is a programming error caught by the catalog tests
        let specs: &[(&str, &str)] = &[
            ("#N화", r"^#(\d+)화\s*$"),
            ("$N화", r"^\$(\d+)화\s*$"),
            // "$001", "$013본문..." - body text may follow the marker
            ("$NNN", r"^\$(\d{3})"),
            // "* * *$003본문..." - scene break fused with the marker
            ("* * *$NNN", r"^\* \* \*\$(\d{3})"),
            ("第N話", r"^第(\d+)話\s*$"),
            ("제N화", r"^제(\d+)화\s*$"),
            // "05. 회귀자가 왜 여기서 나와? (1)"
            ("N. Title (N)", r"^(\d+)\. .+ \(\d+\)"),
            // "10. 길드 옮기려고?"
            ("NN. Title", r"^(\d+)\. .+"),
            ("//N", r"^//(\d+)\s*$"),
        ];

        let patterns = specs
            .iter()
            .map(|(name, src)| {
                SeparatorPattern::new(name, src, MatchKind::LineStart)
                    .unwrap_or_else(|e| panic!("catalog pattern rejected: {}", e))
            })
            .collect();

        let inline = SeparatorPattern::new("$NNN (inline)", r"\$(\d{3})", MatchKind::Inline)
            .unwrap_or_else(|e| panic!("catalog pattern rejected: {}", e));

        Self { patterns, inline }
    }

    /// Line-start patterns, in scan order
    pub fn line_patterns(&self) -> &[SeparatorPattern] {
        &self.patterns
    }

    /// The inline marker pattern ($NNN appearing mid-line)
    pub fn inline_pattern(&self) -> &SeparatorPattern {
        &self.inline
    }

    /// Look up a line-start pattern by symbolic name
    pub fn find(&self, name: &str) -> Option<&SeparatorPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// The merged pattern for manuscripts mixing both combinable variants
    pub fn combined(&self) -> SeparatorPattern {
        SeparatorPattern::new(COMBINED_NAME, COMBINED_REGEX, MatchKind::LineStart)
            .unwrap_or_else(|e| panic!("catalog pattern rejected: {}", e))
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Episode separators that bleed into the tail of the previous episode's
/// content when boundaries sit back-to-back. Anchored at end of content.
static TRAILING_MARKER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\n\s*#\d+화\s*$",
        r"\n\s*\$\d{3}\s*$",
        r"\n\s*\* \* \*\$\d{3}",
        r"\n\s*\* \* \*\s*$",
        r"\n\s*第\d+話\s*$",
        r"\n\s*제\d+화\s*$",
        r"\n\s*\d+화\s*$",
        r"\n\s*//\d+\s*$",
        r"\n\s*\d+\.\s*[^\n]+$",
    ]
    .iter()
    .map(|src| Regex::new(src).expect("Invalid trailing marker regex"))
    .collect()
});

/// Remove a trailing episode marker from episode content.
///
/// The next episode's separator line sometimes ends up appended to the
/// previous episode's body; only the first matching marker is stripped.
pub fn clean_trailing_marker(content: &str) -> String {
    let cleaned = content.trim_end();

    for pattern in TRAILING_MARKER_PATTERNS.iter() {
        if let Some(m) = pattern.find(cleaned) {
            log::debug!("Removed trailing episode marker: {}", m.as_str().trim());
            return cleaned[..m.start()].trim_end().to_string();
        }
    }

    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separatorPattern_withoutCaptureGroup_shouldReject() {
        let result = SeparatorPattern::new("bad", r"^#\d+화$", MatchKind::LineStart);
        assert!(matches!(result, Err(SplitError::InvalidPattern { .. })));
    }

    #[test]
    fn test_separatorPattern_withTwoCaptureGroups_shouldReject() {
        let result = SeparatorPattern::new("bad", r"^(\d+)\.(\d+)", MatchKind::LineStart);
        assert!(result.is_err());
    }

    #[test]
    fn test_separatorPattern_withInvalidRegex_shouldReject() {
        let result = SeparatorPattern::new("bad", r"^([", MatchKind::LineStart);
        assert!(result.is_err());
    }

    #[test]
    fn test_matchLine_shouldExtractNumberAndOffset() {
        let catalog = PatternCatalog::standard();
        let pattern = catalog.find("$NNN").unwrap();

        let (number, end) = pattern.match_line("$013본문 시작").unwrap();
        assert_eq!(number, 13);
        assert_eq!(&"$013본문 시작"[end..], "본문 시작");
    }

    #[test]
    fn test_matchLine_withHashPattern_shouldRequireFullLine() {
        let catalog = PatternCatalog::standard();
        let pattern = catalog.find("#N화").unwrap();

        assert_eq!(pattern.match_line("#12화").map(|(n, _)| n), Some(12));
        assert!(pattern.match_line("#12화 제목이 있다").is_none());
        assert!(pattern.match_line("대사 중 #12화").is_none());
    }

    #[test]
    fn test_combined_shouldMatchBothVariants() {
        let combined = PatternCatalog::standard().combined();

        assert_eq!(combined.match_line("$003").map(|(n, _)| n), Some(3));
        assert_eq!(combined.match_line("* * *$004본문").map(|(n, _)| n), Some(4));
    }

    #[test]
    fn test_cleanTrailingMarker_shouldStripSceneBreakMarker() {
        let content = "...끝이었다.\n\n* * *$003";
        let cleaned = clean_trailing_marker(content);

        assert_eq!(cleaned, "...끝이었다.");
        assert!(!cleaned.contains("* * *$003"));
    }

    #[test]
    fn test_cleanTrailingMarker_withoutMarker_shouldOnlyTrim() {
        assert_eq!(clean_trailing_marker("본문이다.\n"), "본문이다.");
    }

    #[test]
    fn test_cleanTrailingMarker_shouldStripOnlyOneMarker() {
        let content = "본문.\n$002\n$003";
        let cleaned = clean_trailing_marker(content);
        // Only the last marker goes; a second pass would be a content bug
        assert_eq!(cleaned, "본문.\n$002");
    }
}
