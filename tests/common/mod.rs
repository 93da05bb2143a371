/*!
 * Common test utilities for the seriloc test suite
 */

use seriloc::splitting::Episode;

/// Build a marked manuscript with `count` episodes, one `#N화` separator per
/// episode and a body long enough to clear the short-episode heuristic
pub fn marked_manuscript(count: u32) -> String {
    let mut text = String::new();
    for n in 1..=count {
        text.push_str(&format!("#{}화\n{}\n\n", n, episode_body(n)));
    }
    text
}

/// A body of ~40 words for episode `n`
pub fn episode_body(n: u32) -> String {
    format!("{}편의 이야기가 이어진다. ", n)
        .repeat(10)
        .trim_end()
        .to_string()
}

/// Sum of episode content lengths, for content-preservation checks
pub fn total_content_chars(episodes: &[Episode]) -> usize {
    episodes.iter().map(|ep| ep.content.chars().count()).sum()
}
