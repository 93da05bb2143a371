/*!
 * Translation QA validation.
 *
 * A pure scan-and-report pass over one episode's translated text, run once
 * per episode per language. Three defect classes are detected:
 *
 * - language mixing: source-script runs left in the target text
 * - untranslated terms: glossary originals still present verbatim
 * - glossary mismatches: known wrong variants and confusable-character
 *   substitutions of character names
 *
 * Issues are data, not exceptions; a failing validation is a normal,
 * reportable outcome.
 */

use log::debug;
use regex::Regex;

use crate::glossary::store::{Glossary, GlossaryTerm, TermCategory};
use crate::language_utils::Lang;
use crate::qa::confusables::{is_onomatopoeia, similar_alternatives};

/// Defect class of a QA issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Untranslated source-language text embedded in the output
    LanguageMixing,
    /// A glossary original appearing verbatim in the output
    UntranslatedTerm,
    /// A wrong rendering of a glossary term
    GlossaryMismatch,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LanguageMixing => "language_mixing",
            Self::UntranslatedTerm => "untranslated_term",
            Self::GlossaryMismatch => "glossary_mismatch",
        }
    }
}

/// Issue severity. Warnings are reserved for defects judged to be
/// deliberate stylistic choices; everything affecting meaning is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Single QA issue found in a translation
#[derive(Debug, Clone, PartialEq)]
pub struct QaIssue {
    /// Defect class
    pub kind: IssueKind,

    /// Severity
    pub severity: Severity,

    /// The offending substring
    pub text: String,

    /// Human-readable description
    pub message: String,

    /// Character offset of the offending text, when known
    pub position: Option<usize>,

    /// The correct substring, for mechanically fixable issues
    pub expected: Option<String>,

    /// Surrounding text snippet
    pub context: Option<String>,
}

/// Result of one validation pass
#[derive(Debug, Clone)]
pub struct QaResult {
    /// True iff zero error-severity issues were found
    pub passed: bool,

    /// All issues, in detection order
    pub issues: Vec<QaIssue>,

    /// Episode the pass ran over, when known
    pub episode_number: Option<u32>,
}

impl QaResult {
    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Warning).count()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.error_count() > 0
    }

    /// Render a human-readable report block
    pub fn to_report(&self) -> String {
        let status = if self.passed { "PASS" } else { "FAIL" };
        let mut lines = match self.episode_number {
            Some(n) => vec![format!("Episode {} - QA Result: {}", n, status)],
            None => vec![format!("QA Result: {}", status)],
        };

        if !self.issues.is_empty() {
            lines.push(format!(
                "  Errors: {}, Warnings: {}",
                self.error_count(),
                self.warning_count()
            ));
            for issue in &self.issues {
                let severity = match issue.severity {
                    Severity::Error => "ERROR",
                    Severity::Warning => "WARNING",
                };
                lines.push(format!("  [{}] {}", severity, issue.message));
                if let Some(context) = &issue.context {
                    lines.push(format!("    Context: ...{}...", context));
                }
            }
        }

        lines.join("\n")
    }
}

/// Validates one episode's translated text against the glossary
#[derive(Debug)]
pub struct TranslationQaValidator {
    source_lang: Lang,
    target_lang: Lang,

    /// Source and target collapsed to the same language: nothing to check
    skip_translation_checks: bool,

    /// original -> expected translation
    term_map: Vec<(String, String)>,

    /// Character-category terms, for confusable-substitution checks
    char_terms: Vec<GlossaryTerm>,

    /// known wrong variant -> correct translation
    known_variants: Vec<(String, String)>,

    /// Matcher for source-script runs (spaces between runs merged)
    mixing_regex: Option<Regex>,
}

impl TranslationQaValidator {
    pub fn new(glossary: &Glossary) -> Self {
        let source_lang = glossary.source_language;
        let target_lang = glossary.target_language;

        let mut term_map = Vec::new();
        let mut char_terms = Vec::new();
        let mut known_variants = Vec::new();

        for term in glossary.get_all_terms() {
            if term.original.is_empty() || term.translation.is_empty() {
                continue;
            }
            term_map.push((term.original.clone(), term.translation.clone()));

            for variant in &term.known_wrong_variants {
                if !variant.is_empty() && variant != &term.translation {
                    known_variants.push((variant.clone(), term.translation.clone()));
                }
            }

            if term.category == TermCategory::Character {
                char_terms.push(term.clone());
            }
        }

        Self {
            source_lang,
            target_lang,
            skip_translation_checks: source_lang == target_lang,
            term_map,
            char_terms,
            known_variants,
            mixing_regex: source_script_regex(source_lang),
        }
    }

    pub fn source_lang(&self) -> Lang {
        self.source_lang
    }

    pub fn target_lang(&self) -> Lang {
        self.target_lang
    }

    /// Glossary entries relevant to a text fragment, rendered as a prompt
    /// block for targeted re-translation
    pub fn glossary_block_for(&self, fragment: &str, context: &str) -> String {
        let relevant: Vec<&(String, String)> = self
            .term_map
            .iter()
            .filter(|(original, _)| fragment.contains(original.as_str()) || context.contains(original.as_str()))
            .collect();

        if relevant.is_empty() {
            return String::new();
        }

        let mut lines = vec!["Glossary:".to_string()];
        for (original, translation) in relevant {
            lines.push(format!("- {} → {}", original, translation));
        }
        lines.join("\n")
    }

    /// Run all validation checks on translated text
    pub fn validate(&self, text: &str, episode_number: Option<u32>) -> QaResult {
        // Same language on both sides: no translation occurred, no QA is
        // meaningful
        if self.skip_translation_checks {
            return QaResult { passed: true, issues: Vec::new(), episode_number };
        }

        let mut issues = self.check_language_mixing(text);
        issues.extend(self.check_glossary_consistency(text));

        let passed = issues.iter().all(|i| i.severity != Severity::Error);
        debug!(
            "QA validation: {} issues ({} errors)",
            issues.len(),
            issues.iter().filter(|i| i.severity == Severity::Error).count()
        );

        QaResult { passed, issues, episode_number }
    }

    /// Detect source-script runs left in the target text
    pub fn check_language_mixing(&self, text: &str) -> Vec<QaIssue> {
        let Some(regex) = &self.mixing_regex else {
            return Vec::new();
        };

        let mut issues = Vec::new();
        for m in regex.find_iter(text) {
            let run = m.as_str();

            // Onomatopoeia retention is a style choice, not a failure
            let (severity, message) = if self.source_lang == Lang::Korean && is_onomatopoeia(run) {
                (
                    Severity::Warning,
                    format!("Onomatopoeia retained (style choice): \"{}\"", run),
                )
            } else {
                (
                    Severity::Error,
                    format!("Source language ({}) found: \"{}\"", self.source_lang, run),
                )
            };

            issues.push(QaIssue {
                kind: IssueKind::LanguageMixing,
                severity,
                text: run.to_string(),
                message,
                position: Some(char_offset(text, m.start())),
                expected: None,
                context: Some(context_snippet(text, m.start(), m.end(), 30)),
            });
        }

        issues
    }

    /// Check glossary terms are used correctly in the translated text
    pub fn check_glossary_consistency(&self, text: &str) -> Vec<QaIssue> {
        let mut issues = Vec::new();

        // Untranslated originals: the translator ignored the glossary
        for (original, expected) in &self.term_map {
            if let Some(pos) = text.find(original.as_str()) {
                issues.push(QaIssue {
                    kind: IssueKind::UntranslatedTerm,
                    severity: Severity::Error,
                    text: original.clone(),
                    message: format!("Untranslated term: \"{}\" → \"{}\"", original, expected),
                    position: Some(char_offset(text, pos)),
                    expected: Some(expected.clone()),
                    context: Some(context_snippet(text, pos, pos + original.len(), 20)),
                });
            }
        }

        // Known wrong variants: every occurrence is flagged
        for (wrong, correct) in &self.known_variants {
            for (pos, matched) in text.match_indices(wrong.as_str()) {
                issues.push(QaIssue {
                    kind: IssueKind::GlossaryMismatch,
                    severity: Severity::Error,
                    text: wrong.clone(),
                    message: format!(
                        "Known wrong variant: \"{}\" must be \"{}\"",
                        wrong, correct
                    ),
                    position: Some(char_offset(text, pos)),
                    expected: Some(correct.clone()),
                    context: Some(context_snippet(text, pos, pos + matched.len(), 20)),
                });
            }
        }

        // Confusable-character substitutions in character names
        for term in &self.char_terms {
            let expected = &term.translation;
            for alternative in similar_alternatives(expected) {
                if let Some(pos) = text.find(&alternative) {
                    issues.push(QaIssue {
                        kind: IssueKind::GlossaryMismatch,
                        severity: Severity::Error,
                        text: alternative.clone(),
                        message: format!(
                            "Term mismatch: \"{}\" must be \"{}\"",
                            alternative, expected
                        ),
                        position: Some(char_offset(text, pos)),
                        expected: Some(expected.clone()),
                        context: Some(context_snippet(text, pos, pos + alternative.len(), 20)),
                    });
                }
            }
        }

        issues
    }
}

/// Matcher for runs of the source language's script, merging runs separated
/// only by whitespace into a single match
fn source_script_regex(lang: Lang) -> Option<Regex> {
    let (lo, hi) = lang.script_range()?;
    let class = format!(r"[\u{{{:04X}}}-\u{{{:04X}}}]", lo as u32, hi as u32);
    Regex::new(&format!(r"{c}+(?:\s+{c}+)*", c = class)).ok()
}

/// Character offset of a byte position
fn char_offset(text: &str, byte_pos: usize) -> usize {
    text[..byte_pos].chars().count()
}

/// Surrounding snippet with `pad` characters on each side
fn context_snippet(text: &str, start: usize, end: usize, pad: usize) -> String {
    let prefix: String = {
        let mut chars: Vec<char> = text[..start].chars().rev().take(pad).collect();
        chars.reverse();
        chars.into_iter().collect()
    };
    let suffix: String = text[end..].chars().take(pad).collect();
    format!("{}{}{}", prefix, &text[start..end], suffix)
}
