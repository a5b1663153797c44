//! Keyword-window sentiment classification.

use crate::types::Sentiment;

/// Positive-signal keywords, matched as lowercase substrings inside mention
/// context windows. Product-tuned list; order is irrelevant.
pub(crate) const POSITIVE_KEYWORDS: &[&str] = &[
    "recommend",
    "best",
    "leading",
    "top",
    "excellent",
    "great",
    "popular",
    "trusted",
    "innovative",
    "powerful",
    "reliable",
    "outstanding",
];

/// Negative-signal keywords, matched the same way.
pub(crate) const NEGATIVE_KEYWORDS: &[&str] = &[
    "avoid",
    "worst",
    "poor",
    "bad",
    "unreliable",
    "expensive",
    "limited",
    "outdated",
    "controversial",
    "criticized",
    "problematic",
];

/// Number of characters of context examined on each side of a mention.
const CONTEXT_WINDOW_CHARS: usize = 100;

/// Classify sentiment toward the brand.
///
/// Returns [`Sentiment::NotMentioned`] when the brand does not appear.
/// Otherwise builds a lowercased context window of up to 100 characters on
/// each side of every mention offset (falling back to the whole lowercased
/// text if no offsets are usable) and counts positive vs negative keyword
/// hits across all windows. Majority wins; ties — including zero hits on
/// both sides — are neutral.
pub(crate) fn classify_sentiment(
    text: &str,
    brand_name: &str,
    mention_positions: &[usize],
    mentioned: bool,
) -> Sentiment {
    if !mentioned {
        return Sentiment::NotMentioned;
    }

    let windows = context_windows(text, brand_name, mention_positions);

    let mut positive_score = 0usize;
    let mut negative_score = 0usize;
    for window in &windows {
        for kw in POSITIVE_KEYWORDS {
            if window.contains(kw) {
                positive_score += 1;
            }
        }
        for kw in NEGATIVE_KEYWORDS {
            if window.contains(kw) {
                negative_score += 1;
            }
        }
    }

    match positive_score.cmp(&negative_score) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Lowercased context windows around each mention: the mention itself plus
/// up to [`CONTEXT_WINDOW_CHARS`] characters on each side, clamped to the
/// text bounds.
fn context_windows(text: &str, brand_name: &str, mention_positions: &[usize]) -> Vec<String> {
    if mention_positions.is_empty() {
        return vec![text.to_lowercase()];
    }

    let chars: Vec<char> = text.chars().collect();
    let brand_chars = brand_name.chars().count();

    mention_positions
        .iter()
        .map(|&pos| {
            let start = pos.saturating_sub(CONTEXT_WINDOW_CHARS);
            let end = (pos + brand_chars + CONTEXT_WINDOW_CHARS).min(chars.len());
            chars[start.min(chars.len())..end]
                .iter()
                .collect::<String>()
                .to_lowercase()
        })
        .collect()
}
