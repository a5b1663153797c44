//! Ranked-list position detection.

use regex::Regex;

/// Detect the brand's position in a numbered-list style answer.
///
/// Scans lines top to bottom; the first line that starts with an ordinal
/// marker (`<digits>.` or `<digits>)`) and also contains the brand name
/// (case-insensitive substring) yields its ordinal. Returns `None` when no
/// such line exists.
pub(crate) fn detect_rank_position(text: &str, brand_name: &str) -> Option<u32> {
    if brand_name.is_empty() {
        return None;
    }

    let marker_re = Regex::new(r"^\s*(\d+)[.)]\s+").expect("valid regex");
    let brand_lower = brand_name.to_lowercase();

    for line in text.split('\n') {
        let Some(caps) = marker_re.captures(line) else {
            continue;
        };
        if !line.to_lowercase().contains(&brand_lower) {
            continue;
        }
        if let Ok(ordinal) = caps[1].parse::<u32>() {
            return Some(ordinal);
        }
    }
    None
}
