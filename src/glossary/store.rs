/*!
 * Versioned terminology store for translation consistency.
 *
 * One glossary exists per series per target language and is the single
 * source of truth for every translation call that references that language.
 * A term's `original` is unique: duplicate inserts are logged and ignored,
 * corrections go through `update_term`.
 */

use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::GlossaryError;
use crate::file_utils::FileManager;
use crate::language_utils::Lang;
use crate::providers::TermCandidate;

/// Category of a glossary term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermCategory {
    Character,
    Location,
    Organization,
    Title,
    Item,
    Skill,
    #[default]
    Term,
}

impl TermCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Organization => "organization",
            Self::Title => "title",
            Self::Item => "item",
            Self::Skill => "skill",
            Self::Term => "term",
        }
    }

    /// Longest plausible translation for this category. Anything longer is
    /// a sign the backend generated prose instead of a term.
    pub fn max_translation_len(&self) -> usize {
        match self {
            Self::Location => 100,
            _ => 50,
        }
    }
}

impl std::fmt::Display for TermCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One glossary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    /// Source-language surface form (unique within a glossary)
    pub original: String,

    /// Target-language surface form
    pub translation: String,

    /// Term category
    #[serde(default)]
    pub category: TermCategory,

    /// Free-text usage context
    #[serde(default)]
    pub context: String,

    /// Episode reference where the term first appeared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_appearance: Option<String>,

    /// Previously-seen incorrect translations, kept for QA detection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_wrong_variants: Vec<String>,
}

impl GlossaryTerm {
    pub fn new(original: &str, translation: &str, category: TermCategory, context: &str) -> Self {
        Self {
            original: original.to_string(),
            translation: translation.to_string(),
            category,
            context: context.to_string(),
            first_appearance: None,
            known_wrong_variants: Vec::new(),
        }
    }
}

/// Per-series, per-target-language terminology record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Glossary {
    /// Series the glossary belongs to
    pub series_name: String,

    /// Source language of the originals
    pub source_language: Lang,

    /// Target language of the translations
    pub target_language: Lang,

    /// Creation timestamp, RFC 3339
    pub created_date: String,

    /// Last mutation timestamp, RFC 3339
    pub last_updated: String,

    /// The term list
    pub terms: Vec<GlossaryTerm>,
}

impl Glossary {
    /// Create an empty glossary for a series/language pair
    pub fn create(series_name: &str, source_language: Lang, target_language: Lang) -> Self {
        let now = Local::now().to_rfc3339();
        info!(
            "Created glossary for '{}' ({} -> {})",
            series_name, source_language, target_language
        );
        Self {
            series_name: series_name.to_string(),
            source_language,
            target_language,
            created_date: now.clone(),
            last_updated: now,
            terms: Vec::new(),
        }
    }

    /// Load a glossary record from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GlossaryError> {
        let glossary: Self = FileManager::read_json(&path)
            .map_err(|e| GlossaryError::Malformed(e.to_string()))?;
        info!("Loaded glossary: {:?} ({} terms)", path.as_ref(), glossary.terms.len());
        Ok(glossary)
    }

    /// Save the glossary record, refreshing its update timestamp
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), GlossaryError> {
        self.last_updated = Local::now().to_rfc3339();
        FileManager::write_json(&path, self).map_err(|e| GlossaryError::Io(e.to_string()))?;
        info!("Saved glossary: {:?}", path.as_ref());
        Ok(())
    }

    /// Add a new term. Duplicate originals are a logged no-op: the first
    /// insertion wins and corrections must go through `update_term`.
    pub fn add_term(&mut self, term: GlossaryTerm) -> bool {
        if self.find_term(&term.original).is_some() {
            warn!("Term '{}' already exists in glossary", term.original);
            return false;
        }

        info!("Added term: {} -> {} ({})", term.original, term.translation, term.category);
        self.terms.push(term);
        true
    }

    /// Update an existing term in place. Returns false when the original is
    /// not present.
    pub fn update_term(&mut self, original: &str, update: impl FnOnce(&mut GlossaryTerm)) -> bool {
        match self.terms.iter_mut().find(|t| t.original == original) {
            Some(term) => {
                update(term);
                info!("Updated term: {}", original);
                true
            }
            None => {
                warn!("Term not found: {}", original);
                false
            }
        }
    }

    /// Find a term by its original surface form
    pub fn find_term(&self, original: &str) -> Option<&GlossaryTerm> {
        self.terms.iter().find(|t| t.original == original)
    }

    /// Translation for an original, when present
    pub fn get_translation(&self, original: &str) -> Option<&str> {
        self.find_term(original).map(|t| t.translation.as_str())
    }

    /// All terms, in insertion order
    pub fn get_all_terms(&self) -> &[GlossaryTerm] {
        &self.terms
    }

    /// Terms in one category
    pub fn terms_by_category(&self, category: TermCategory) -> Vec<&GlossaryTerm> {
        self.terms.iter().filter(|t| t.category == category).collect()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Drop extraction candidates whose original is already present
    pub fn filter_new_terms(&self, candidates: &[TermCandidate]) -> Vec<TermCandidate> {
        let existing: HashSet<&str> = self.terms.iter().map(|t| t.original.as_str()).collect();
        let new_terms: Vec<TermCandidate> = candidates
            .iter()
            .filter(|c| !existing.contains(c.original.as_str()))
            .cloned()
            .collect();

        if !new_terms.is_empty() {
            info!("Found {} new terms (out of {} candidates)", new_terms.len(), candidates.len());
        }
        new_terms
    }

    /// Format the glossary as a prompt block for translation calls
    pub fn format_for_prompt(&self) -> String {
        if self.terms.is_empty() {
            return "No terms in glossary.".to_string();
        }

        let mut lines = vec!["=== GLOSSARY ===".to_string()];

        let mut categories: Vec<TermCategory> = self.terms.iter().map(|t| t.category).collect();
        categories.sort_by_key(|c| c.as_str());
        categories.dedup();

        for category in categories {
            lines.push(format!("\n[{}]", category.as_str().to_uppercase()));
            for term in self.terms.iter().filter(|t| t.category == category) {
                let mut line = format!("- {} → {}", term.original, term.translation);
                if !term.context.is_empty() {
                    line.push_str(&format!(" ({})", term.context));
                }
                lines.push(line);
            }
        }

        lines.push("\n=== END GLOSSARY ===".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glossary() -> Glossary {
        Glossary::create("테스트 시리즈", Lang::Korean, Lang::Japanese)
    }

    #[test]
    fn test_addTerm_withDuplicate_shouldIgnoreSecondInsert() {
        let mut g = glossary();

        assert!(g.add_term(GlossaryTerm::new("서연", "ソヨン", TermCategory::Character, "")));
        assert!(!g.add_term(GlossaryTerm::new("서연", "セヨン", TermCategory::Character, "")));

        assert_eq!(g.term_count(), 1);
        assert_eq!(g.get_translation("서연"), Some("ソヨン"));
    }

    #[test]
    fn test_updateTerm_shouldMutateExisting() {
        let mut g = glossary();
        g.add_term(GlossaryTerm::new("서연", "セヨン", TermCategory::Character, ""));

        let updated = g.update_term("서연", |t| t.translation = "ソヨン".to_string());

        assert!(updated);
        assert_eq!(g.get_translation("서연"), Some("ソヨン"));
    }

    #[test]
    fn test_updateTerm_withMissingOriginal_shouldReturnFalse() {
        let mut g = glossary();
        assert!(!g.update_term("없는용어", |t| t.translation = "x".to_string()));
    }

    #[test]
    fn test_filterNewTerms_shouldDropKnownOriginals() {
        let mut g = glossary();
        g.add_term(GlossaryTerm::new("마탑", "魔塔", TermCategory::Location, ""));

        let candidates = vec![
            TermCandidate {
                original: "마탑".to_string(),
                category: TermCategory::Location,
                context: String::new(),
            },
            TermCandidate {
                original: "흑검".to_string(),
                category: TermCategory::Item,
                context: String::new(),
            },
        ];

        let fresh = g.filter_new_terms(&candidates);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].original, "흑검");
    }

    #[test]
    fn test_formatForPrompt_shouldGroupByCategory() {
        let mut g = glossary();
        g.add_term(GlossaryTerm::new("이서연", "イ・ソヨン", TermCategory::Character, "주인공"));
        g.add_term(GlossaryTerm::new("마탑", "魔塔", TermCategory::Location, ""));

        let block = g.format_for_prompt();

        assert!(block.contains("[CHARACTER]"));
        assert!(block.contains("[LOCATION]"));
        assert!(block.contains("- 이서연 → イ・ソヨン (주인공)"));
        assert!(block.starts_with("=== GLOSSARY ==="));
    }

    #[test]
    fn test_glossary_jsonRoundTrip() {
        let mut g = glossary();
        g.add_term(GlossaryTerm::new("서연", "ソヨン", TermCategory::Character, "여주인공"));

        let json = serde_json::to_string(&g).unwrap();
        let back: Glossary = serde_json::from_str(&json).unwrap();

        assert_eq!(back.terms, g.terms);
        assert_eq!(back.target_language, Lang::Japanese);
    }

    #[test]
    fn test_maxTranslationLen_shouldBeLongerForLocations() {
        assert_eq!(TermCategory::Location.max_translation_len(), 100);
        assert_eq!(TermCategory::Character.max_translation_len(), 50);
    }
}
