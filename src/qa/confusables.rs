/*!
 * Fixed lookup tables for translation QA.
 *
 * - Han characters an LLM commonly confuses when transliterating Korean
 *   name syllables (similar appearance or shared reading)
 * - Korean onomatopoeia/mimetic words that translators deliberately keep,
 *   which downgrades their detection from error to warning
 */

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Confusable Han characters, keyed by the correct character.
///
/// Keys are the renderings vetted through the glossary; values are the
/// substitutions observed coming back from the model for the same syllable.
pub static SIMILAR_CHARACTERS: Lazy<HashMap<char, &'static [char]>> = Lazy::new(|| {
    let mut map: HashMap<char, &'static [char]> = HashMap::new();
    // 현 (hyeon)
    map.insert('賢', &['炫', '玄', '鉉', '泫', '眩']);
    // 준 (jun)
    map.insert('俊', &['浚', '峻', '駿', '濬']);
    // 민 (min)
    map.insert('敏', &['民', '珉', '旻', '玟', '憫']);
    // 조 (jo) - surname
    map.insert('趙', &['曹', '兆', '朝']);
    // 휘 (hwi)
    map.insert('輝', &['煇', '暉', '徽', '揮']);
    // 인 (in)
    map.insert('仁', &['寅', '認']);
    // 수 (su)
    map.insert('秀', &['洙', '壽', '修', '守']);
    // 혁 (hyeok)
    map.insert('赫', &['爀', '嚇']);
    // 윤 (yun)
    map.insert('允', &['尹', '潤', '倫']);
    // 제 (je)
    map.insert('濟', &['済', '祭', '制']);
    // 아 (a)
    map.insert('雅', &['亞', '娥', '芽']);
    map
});

/// Korean onomatopoeia and mimetic words that may intentionally remain
/// untranslated as a style choice
pub static KOREAN_ONOMATOPOEIA: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Sound effects
        "킁킁", "쿵", "쾅", "짝짝", "딩동", "띵동", "뚝뚝", "졸졸", "철썩", "쨍그랑",
        "빵", "펑", "탁", "딱", "쩝쩝", "찍찍", "끽끽", "끼익", "삐걱", "덜컹",
        "쿵쿵", "쾅쾅", "두근두근", "콩닥콩닥",
        // Emotional expressions
        "훗", "흥", "헉", "엉엉", "흑흑", "앙앙", "깔깔", "히히", "호호", "끄덕끄덕",
        "푸하하", "껄껄", "키득키득", "끙끙", "쩝", "푸", "헐", "엥", "에잇",
        // Movement/state
        "살금살금", "후다닥", "뚜벅뚜벅", "터벅터벅", "휘청휘청", "비틀비틀",
        "아장아장", "뒤뚱뒤뚱", "사뿐사뿐",
    ]
    .into_iter()
    .collect()
});

/// Whether a leaked run is wholly composed of allow-listed onomatopoeia
pub fn is_onomatopoeia(run: &str) -> bool {
    let mut tokens = run.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return false;
    }
    tokens.all(|token| KOREAN_ONOMATOPOEIA.contains(token))
}

/// Generate every plausible wrong rendering of a translation by swapping
/// each character for its confusable alternatives, one at a time.
pub fn similar_alternatives(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut alternatives = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        if let Some(substitutes) = SIMILAR_CHARACTERS.get(c) {
            for alt in substitutes.iter().filter(|alt| *alt != c) {
                let mut candidate = chars.clone();
                candidate[i] = *alt;
                alternatives.push(candidate.iter().collect());
            }
        }
    }

    alternatives
}
