use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language utilities for the localization pipeline
///
/// This module maps the loosely-spelled language identifiers used in
/// manuscripts and config files ("korean", "ko", "kor", "taiwanese", ...)
/// onto a small closed enum, and carries the Unicode script knowledge the
/// QA validator and name-consistency enforcer need.
/// A language the pipeline can read from or write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    Korean,
    Japanese,
    /// Traditional Chinese as written for the Taiwanese market
    TraditionalChinese,
    English,
}

impl Lang {
    /// Lowercase identifier used in file names and config values
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Korean => "korean",
            Self::Japanese => "japanese",
            Self::TraditionalChinese => "traditional_chinese",
            Self::English => "english",
        }
    }

    /// Display name for logs and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Korean => "Korean",
            Self::Japanese => "Japanese",
            Self::TraditionalChinese => "Traditional Chinese",
            Self::English => "English",
        }
    }

    /// Inclusive Unicode range of the language's primary script, used to
    /// detect leaked source-language text in a translation.
    ///
    /// For Japanese this is the Hiragana..Katakana span; Kanji overlaps with
    /// Chinese and is deliberately excluded so Japanese-in-Chinese leakage
    /// is judged on the kana alone.
    pub fn script_range(&self) -> Option<(char, char)> {
        match self {
            Self::Korean => Some(('\u{AC00}', '\u{D7AF}')),
            Self::Japanese => Some(('\u{3040}', '\u{30FF}')),
            Self::TraditionalChinese => Some(('\u{4E00}', '\u{9FFF}')),
            Self::English => None,
        }
    }

    /// Whether a character belongs to this language's primary script
    pub fn is_script_char(&self, c: char) -> bool {
        match self.script_range() {
            Some((lo, hi)) => c >= lo && c <= hi,
            None => c.is_ascii_alphabetic(),
        }
    }

    /// Character class used when hunting for a mistranslated personal name
    /// inside this language's rendering of a compound term.
    pub fn is_name_char(&self, c: char) -> bool {
        match self {
            // Han ideographs
            Self::TraditionalChinese => ('\u{4E00}'..='\u{9FFF}').contains(&c),
            // Katakana, the script Korean names are transliterated into
            Self::Japanese => ('\u{30A0}'..='\u{30FF}').contains(&c),
            Self::Korean => ('\u{AC00}'..='\u{D7AF}').contains(&c),
            Self::English => c.is_ascii_alphabetic(),
        }
    }

    /// Name-part separators this language's orthography uses between the
    /// segments of a transliterated foreign name (e.g. "イ・ソヨン").
    /// Empty for scripts that concatenate surname and given name directly.
    pub fn name_separators(&self) -> &'static [char] {
        match self {
            Self::Japanese => &['・'],
            Self::TraditionalChinese => &['·', '・'],
            _ => &[],
        }
    }

    /// Keywords that mark special episodes in this language
    pub fn special_episode_keywords(&self) -> SpecialKeywords {
        match self {
            Self::Korean => SpecialKeywords {
                prologue: &["프롤로그"],
                epilogue: &["에필로그"],
                extra: &["번외", "외전"],
            },
            Self::Japanese => SpecialKeywords {
                prologue: &["プロローグ"],
                epilogue: &["エピローグ"],
                extra: &["番外編"],
            },
            _ => SpecialKeywords {
                prologue: &["prologue"],
                epilogue: &["epilogue"],
                extra: &["extra"],
            },
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Lang {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_language(s)
    }
}

/// Prologue/epilogue/extra keyword hints for one language
#[derive(Debug, Clone, Copy)]
pub struct SpecialKeywords {
    pub prologue: &'static [&'static str],
    pub epilogue: &'static [&'static str],
    pub extra: &'static [&'static str],
}

/// Parse a language identifier: an English name, a pipeline alias, or an
/// ISO 639-1/639-3 code.
pub fn parse_language(ident: &str) -> Result<Lang> {
    let normalized = ident.trim().to_lowercase();

    match normalized.as_str() {
        "korean" => return Ok(Lang::Korean),
        "japanese" => return Ok(Lang::Japanese),
        // "taiwanese" is what the upstream manuscripts call the zh-TW target
        "taiwanese" | "traditional_chinese" | "chinese" | "mandarin" => {
            return Ok(Lang::TraditionalChinese);
        }
        "english" => return Ok(Lang::English),
        _ => {}
    }

    // Fall back to ISO code lookup for 2- and 3-letter identifiers
    let iso = match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    };

    match iso {
        Some(lang) => match lang.to_639_3() {
            "kor" => Ok(Lang::Korean),
            "jpn" => Ok(Lang::Japanese),
            "zho" | "cmn" => Ok(Lang::TraditionalChinese),
            "eng" => Ok(Lang::English),
            other => Err(anyhow!("Unsupported language: {} ({})", ident, other)),
        },
        None => Err(anyhow!("Invalid language identifier: {}", ident)),
    }
}

/// Check whether two language identifiers refer to the same language once
/// aliases are collapsed. Used for the self-language QA skip.
pub fn languages_match(a: &str, b: &str) -> bool {
    match (parse_language(a), parse_language(b)) {
        (Ok(la), Ok(lb)) => la == lb,
        // Unknown identifiers only match themselves verbatim
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

/// Count the characters of `text` that belong to `lang`'s primary script
pub fn script_char_count(text: &str, lang: Lang) -> usize {
    text.chars().filter(|c| lang.is_script_char(*c)).count()
}

/// Whether `text` contains any character of `lang`'s primary script
pub fn contains_script(text: &str, lang: Lang) -> bool {
    text.chars().any(|c| lang.is_script_char(c))
}
