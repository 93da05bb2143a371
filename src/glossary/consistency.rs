/*!
 * Name-consistency enforcement across glossary terms.
 *
 * A backend translating terms one at a time has no memory across calls, so
 * a full name ("이서연") and its bare given name ("서연", extracted as a
 * separate entry) can come back with unrelated renderings ("李書妍" vs
 * "舒妍"). Readers perceive that as a broken character identity.
 *
 * The enforcer derives the canonical given-name rendering from the full
 * name's translation and rewrites every other term to match: exact given
 * names directly, compound phrases ("서연의 고모") by fragment replacement,
 * and as a last resort by a positional window scan for a same-length run of
 * name-script characters near where the name should sit.
 */

use log::{debug, info};

use crate::glossary::store::{GlossaryTerm, TermCategory};
use crate::language_utils::Lang;
use std::collections::{HashMap, HashSet};

/// Recognized single-character Korean surnames
const KOREAN_SURNAMES: &str = "김이박최정강조윤장임한오서신권황안송류전홍고문양손배백허유남심노하곽성차주우구민진나지엄변채원천방공";

/// Why one correction was applied
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionReason {
    /// The term IS an indexed given name
    MatchedGivenName { given_name: String },

    /// The term IS the short form of a multi-part foreign name
    MatchedForeignName { short_name: String },

    /// A wrong given-name fragment inside a compound term was replaced
    CompoundReplacement { wrong: String, correct: String },

    /// The positional window heuristic replaced a suspect run
    PositionalReplacement { wrong: String, correct: String },
}

/// Provenance record for one applied correction.
///
/// Kept out of the term representation itself: corrections are reported
/// through this side-channel instead of grafting bookkeeping fields onto
/// glossary entries.
#[derive(Debug, Clone)]
pub struct CorrectionRecord {
    /// Original of the corrected term
    pub original: String,

    /// Translation before the correction
    pub old_translation: String,

    /// Translation after the correction
    pub new_translation: String,

    /// Why the change was made
    pub reason: CorrectionReason,
}

/// All corrections applied in one enforcement run
#[derive(Debug, Clone, Default)]
pub struct CorrectionLog {
    pub records: Vec<CorrectionRecord>,
}

impl CorrectionLog {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    fn record(
        &mut self,
        term: &GlossaryTerm,
        old: String,
        reason: CorrectionReason,
    ) {
        debug!(
            "Fixed name consistency: {}: {} → {}",
            term.original, old, term.translation
        );
        self.records.push(CorrectionRecord {
            original: term.original.clone(),
            old_translation: old,
            new_translation: term.translation.clone(),
            reason,
        });
    }
}

/// Enforces full-name/given-name translation consistency
#[derive(Debug)]
pub struct NameConsistencyEnforcer {
    target_lang: Lang,
    /// Enable the last-resort positional window heuristic
    positional_fallback: bool,
}

impl NameConsistencyEnforcer {
    pub fn new(target_lang: Lang) -> Self {
        Self { target_lang, positional_fallback: true }
    }

    /// Toggle the positional window heuristic (kept separately switchable
    /// for diagnosis; it trades occasional wrong corrections for recall)
    pub fn with_positional_fallback(mut self, enabled: bool) -> Self {
        self.positional_fallback = enabled;
        self
    }

    /// Correct the term list in place, returning the applied corrections.
    ///
    /// This is a quality-improvement pass: it logs, it never fails.
    pub fn enforce(&self, terms: &mut [GlossaryTerm]) -> CorrectionLog {
        let mut log = CorrectionLog::default();

        // Pass 1: index canonical given-name renderings from full names
        let mut given_name_map: HashMap<String, String> = HashMap::new();
        let mut foreign_name_map: HashMap<String, String> = HashMap::new();
        let mut full_names: HashSet<String> = HashSet::new();

        for term in terms.iter().filter(|t| t.category == TermCategory::Character) {
            if let Some((given, given_translation)) = self.split_full_name(term) {
                full_names.insert(term.original.clone());
                given_name_map.insert(given, given_translation);
            }

            if let Some((short, short_translation)) = self.split_foreign_name(term) {
                full_names.insert(term.original.clone());
                foreign_name_map.insert(short, short_translation);
            }
        }

        if given_name_map.is_empty() && foreign_name_map.is_empty() {
            return log;
        }

        // Snapshot of pre-correction renderings (and any wrong variants
        // recorded by earlier runs), used to locate the stale fragment
        // inside compound-term translations
        let mut snapshot: HashMap<String, Vec<String>> = HashMap::new();
        for term in terms.iter().filter(|t| t.category == TermCategory::Character) {
            let mut renderings = vec![term.translation.clone()];
            renderings.extend(term.known_wrong_variants.iter().cloned());
            snapshot.insert(term.original.clone(), renderings);
        }

        // Pass 2: correct everything that is not itself a full name. Full
        // names are the source of truth, never correction targets.
        for term in terms.iter_mut() {
            if full_names.contains(&term.original) {
                continue;
            }

            if let Some(correct) = foreign_name_map.get(&term.original) {
                if term.translation != *correct {
                    let old = std::mem::replace(&mut term.translation, correct.clone());
                    term.known_wrong_variants.push(old.clone());
                    let reason = CorrectionReason::MatchedForeignName {
                        short_name: term.original.clone(),
                    };
                    log.record(term, old, reason);
                }
                continue;
            }

            for (given, correct) in &given_name_map {
                if !term.original.contains(given.as_str()) {
                    continue;
                }

                if term.original == *given {
                    if term.translation != *correct {
                        let old = std::mem::replace(&mut term.translation, correct.clone());
                        term.known_wrong_variants.push(old.clone());
                        let reason =
                            CorrectionReason::MatchedGivenName { given_name: given.clone() };
                        log.record(term, old, reason);
                    }
                } else {
                    self.correct_compound(term, given, correct, &snapshot, &mut log);
                }
                break;
            }
        }

        if log.count() > 0 {
            info!("Fixed {} name consistency issues", log.count());
        }

        log
    }

    /// Split a full-name character term into its given name and the given
    /// name's rendering, per the target script's convention.
    fn split_full_name(&self, term: &GlossaryTerm) -> Option<(String, String)> {
        let chars: Vec<char> = term.original.chars().collect();

        // Full names are 3+ chars: single-char surname + 2+ char given name.
        // The length floor stops "서연" being read as surname 서 + given 연.
        if chars.len() < 3 || !KOREAN_SURNAMES.contains(chars[0]) {
            return None;
        }
        let given: String = chars[1..].iter().collect();
        if given.chars().count() < 2 {
            return None;
        }

        let given_translation = self.split_given_translation(&term.translation)?;
        Some((given, given_translation))
    }

    /// Extract the given-name part of a full name's translation
    fn split_given_translation(&self, translation: &str) -> Option<String> {
        let separators = self.target_lang.name_separators();

        // Delimited script: "イ・ソヨン" → "ソヨン"
        for sep in separators {
            if let Some((_, given)) = translation.split_once(*sep) {
                if !given.is_empty() {
                    return Some(given.to_string());
                }
            }
        }

        // Concatenating script: "李書妍" → "書妍" (first char is the surname)
        if self.target_lang == Lang::TraditionalChinese {
            let chars: Vec<char> = translation.chars().collect();
            if chars.len() >= 3 {
                return Some(chars[1..].iter().collect());
            }
        }

        None
    }

    /// Split a space-separated multi-part foreign name ("아이든 시몬
    /// 오르피어스") into its short form and that form's rendering.
    fn split_foreign_name(&self, term: &GlossaryTerm) -> Option<(String, String)> {
        let mut tokens = term.original.split_whitespace();
        let short = tokens.next()?.to_string();
        tokens.next()?; // require at least two tokens

        let translation = &term.translation;
        let separators = self.target_lang.name_separators();

        for sep in separators {
            if let Some((head, _)) = translation.split_once(*sep) {
                if !head.is_empty() {
                    return Some((short, head.to_string()));
                }
            }
        }
        // Some renderings keep the space-separated shape
        if let Some((head, _)) = translation.split_once(' ') {
            if !head.is_empty() {
                return Some((short, head.to_string()));
            }
        }

        None
    }

    /// Fix a compound term ("서연의 고모") whose translation embeds a stale
    /// rendering of the given name.
    fn correct_compound(
        &self,
        term: &mut GlossaryTerm,
        given: &str,
        correct: &str,
        snapshot: &HashMap<String, Vec<String>>,
        log: &mut CorrectionLog,
    ) {
        if term.translation.contains(correct) {
            return;
        }

        // Direct fragment replacement: some known rendering of the given
        // name is findable inside the compound's translation
        for wrong in snapshot.get(given).map(Vec::as_slice).unwrap_or(&[]) {
            if !wrong.is_empty() && wrong != correct && term.translation.contains(wrong.as_str()) {
                let old = term.translation.clone();
                term.translation = term.translation.replace(wrong.as_str(), correct);
                let reason = CorrectionReason::CompoundReplacement {
                    wrong: wrong.clone(),
                    correct: correct.to_string(),
                };
                log.record(term, old, reason);
                return;
            }
        }

        if self.positional_fallback {
            self.positional_replace(term, given, correct, log);
        }
    }

    /// Last-resort heuristic: project the given name's relative position in
    /// the original onto the translation and scan a small window for a
    /// same-length run of name-script characters that differs from the
    /// correct rendering. False positives are possible and accepted; the
    /// alternative (a visibly inconsistent character identity) is worse.
    fn positional_replace(
        &self,
        term: &mut GlossaryTerm,
        given: &str,
        correct: &str,
        log: &mut CorrectionLog,
    ) {
        let Some(byte_pos) = term.original.find(given) else {
            return;
        };

        let original_len = term.original.chars().count();
        if original_len == 0 {
            return;
        }
        let name_pos = term.original[..byte_pos].chars().count();

        let t_chars: Vec<char> = term.translation.chars().collect();
        let correct_chars: Vec<char> = correct.chars().collect();
        let correct_len = correct_chars.len();
        if correct_len < 2 || t_chars.len() < correct_len {
            return;
        }

        let pos_ratio = name_pos as f64 / original_len as f64;
        let expected_pos = (pos_ratio * t_chars.len() as f64) as usize;

        let search_start = expected_pos.saturating_sub(2);
        let search_end = (expected_pos + correct_len + 2).min(t_chars.len());
        if search_start + correct_len > search_end {
            return;
        }

        for i in search_start..=(search_end - correct_len) {
            let candidate = &t_chars[i..i + correct_len];
            let looks_like_name = candidate.iter().all(|c| self.target_lang.is_name_char(*c));

            if looks_like_name && candidate != correct_chars.as_slice() {
                let wrong: String = candidate.iter().collect();
                let old = term.translation.clone();

                let mut fixed: String = t_chars[..i].iter().collect();
                fixed.push_str(correct);
                fixed.extend(&t_chars[i + correct_len..]);
                term.translation = fixed;

                let reason = CorrectionReason::PositionalReplacement {
                    wrong,
                    correct: correct.to_string(),
                };
                log.record(term, old, reason);
                return;
            }
        }
    }
}
