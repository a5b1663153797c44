//! Brand-name and domain detection.

use regex::RegexBuilder;

/// Find every case-insensitive whole-word occurrence of `brand_name` in
/// `text` and return the character offset of each match, ascending.
///
/// Offsets are character indices, not byte indices, so stored positions
/// index the original text consistently regardless of UTF-8 width.
pub(crate) fn detect_mentions(text: &str, brand_name: &str) -> Vec<usize> {
    if brand_name.trim().is_empty() {
        return Vec::new();
    }

    let pattern = format!(r"\b{}\b", regex::escape(brand_name));
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped brand name is a valid regex");

    let mut positions = Vec::new();
    let mut char_idx = 0usize;
    let mut byte_idx = 0usize;
    for m in re.find_iter(text) {
        // Matches arrive in ascending byte order; advance the char counter
        // incrementally instead of rescanning from the start each time.
        char_idx += text[byte_idx..m.start()].chars().count();
        byte_idx = m.start();
        positions.push(char_idx);
    }
    positions
}

/// Case-insensitive substring match of `domain` anywhere in `text`.
///
/// No word-boundary requirement: domains commonly appear inside URLs.
pub(crate) fn detect_domain(text: &str, domain: Option<&str>) -> bool {
    match domain {
        Some(d) if !d.is_empty() => text.to_lowercase().contains(&d.to_lowercase()),
        _ => false,
    }
}
