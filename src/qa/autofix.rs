/*!
 * Mechanical repair of QA issues, with a bounded retry loop.
 *
 * Glossary mismatches and untranslated terms with a known expected value
 * are fixed by literal replacement. Error-severity language mixing has no
 * target-language text to substitute, so the leaked segments are batched
 * through the backend for targeted re-translation; a returned segment that
 * still contains source script is rejected and the issue surfaces upward,
 * never silently accepted.
 */

use log::{info, warn};

use crate::glossary::store::Glossary;
use crate::language_utils::contains_script;
use crate::providers::Backend;
use crate::qa::validator::{IssueKind, QaIssue, QaResult, Severity, TranslationQaValidator};

/// Result of one auto-fix pass
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// Text after all applied fixes
    pub text: String,

    /// Number of issues mechanically fixed
    pub fixed_count: usize,

    /// Issues that could not be fixed, preserved for the report
    pub unfixed: Vec<QaIssue>,
}

/// Attempt to automatically fix the issues found in one validation pass.
///
/// Without a backend, language-mixing errors are unfixable and land in the
/// unfixed list.
pub async fn auto_fix(
    validator: &TranslationQaValidator,
    text: &str,
    issues: Vec<QaIssue>,
    backend: Option<&dyn Backend>,
) -> FixOutcome {
    let mut fixed_text = text.to_string();
    let mut fixed_count = 0;
    let mut unfixed = Vec::new();
    let mut mixing_errors = Vec::new();

    for issue in issues {
        match issue.kind {
            IssueKind::GlossaryMismatch | IssueKind::UntranslatedTerm => {
                // Pure, local, always safe: literal replacement with the
                // expected rendering
                match issue.expected.clone() {
                    Some(expected) => {
                        if fixed_text.contains(&issue.text) {
                            fixed_text = fixed_text.replace(&issue.text, &expected);
                            fixed_count += 1;
                            info!(
                                "Auto-fixed {}: {} → {}",
                                issue.kind.as_str(),
                                issue.text,
                                expected
                            );
                        }
                    }
                    None => unfixed.push(issue),
                }
            }
            IssueKind::LanguageMixing if issue.severity == Severity::Error => {
                mixing_errors.push(issue);
            }
            _ => unfixed.push(issue),
        }
    }

    if !mixing_errors.is_empty() {
        match backend {
            Some(backend) => {
                fix_language_mixing(
                    validator,
                    &mut fixed_text,
                    mixing_errors,
                    backend,
                    &mut fixed_count,
                    &mut unfixed,
                )
                .await;
            }
            None => unfixed.extend(mixing_errors),
        }
    }

    FixOutcome { text: fixed_text, fixed_count, unfixed }
}

/// Re-translate leaked source-script segments through the backend
async fn fix_language_mixing(
    validator: &TranslationQaValidator,
    fixed_text: &mut String,
    issues: Vec<QaIssue>,
    backend: &dyn Backend,
    fixed_count: &mut usize,
    unfixed: &mut Vec<QaIssue>,
) {
    let source_lang = validator.source_lang();
    let target_lang = validator.target_lang();

    for issue in issues {
        let segment = issue.text.clone();

        // An earlier replacement may have consumed a duplicate occurrence
        if !fixed_text.contains(&segment) {
            continue;
        }

        let context = issue.context.clone().unwrap_or_default();
        let glossary_block = validator.glossary_block_for(&segment, &context);

        match backend
            .translate_segment(&segment, source_lang, target_lang, &context, &glossary_block)
            .await
        {
            Ok(translated) => {
                let translated = translated.trim();
                // Accept only if the leak is actually gone
                if !translated.is_empty() && !contains_script(translated, source_lang) {
                    let spliced = fixed_text.replacen(&segment, translated, 1);
                    *fixed_text = spliced;
                    *fixed_count += 1;
                    info!("Auto-fixed language mixing: {} → {}", segment, translated);
                } else {
                    warn!("Re-translation still contains source script: {} → {}", segment, translated);
                    unfixed.push(issue);
                }
            }
            Err(e) => {
                warn!("Re-translation failed for '{}': {}", segment, e);
                unfixed.push(issue);
            }
        }
    }
}

/// Result of a full validate-fix-revalidate loop over one episode
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Final text after all applied fixes
    pub text: String,

    /// Result of the last validation pass
    pub result: QaResult,

    /// Total fixes applied across all passes
    pub total_fixed: usize,

    /// Validation passes consumed
    pub passes: u32,
}

/// Validate an episode and repeatedly auto-fix it, re-validating with a
/// fresh validator after each pass.
///
/// The loop stops when validation passes, when the retry budget is
/// exhausted, or immediately when a pass fixes nothing while errors remain
/// (further retries cannot help).
pub async fn validate_and_repair(
    glossary: &Glossary,
    text: &str,
    episode_number: Option<u32>,
    backend: Option<&dyn Backend>,
    max_retries: u32,
) -> RepairOutcome {
    let max_retries = max_retries.max(1);
    let mut current = text.to_string();
    let mut total_fixed = 0;
    let mut passes = 0;

    loop {
        passes += 1;
        let validator = TranslationQaValidator::new(glossary);
        let result = validator.validate(&current, episode_number);

        if result.passed || passes >= max_retries {
            return RepairOutcome { text: current, result, total_fixed, passes };
        }

        let outcome = auto_fix(&validator, &current, result.issues.clone(), backend).await;
        current = outcome.text;
        total_fixed += outcome.fixed_count;

        if outcome.fixed_count == 0 {
            // The remaining issues are apparently unfixable automatically
            warn!(
                "No fixes applied but {} errors remain, stopping retry loop",
                result.error_count()
            );
            let result = validator.validate(&current, episode_number);
            return RepairOutcome { text: current, result, total_fixed, passes };
        }
    }
}
