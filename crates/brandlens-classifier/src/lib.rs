//! Response classification for BrandLens.
//!
//! Turns one free-text backend response into structured, scored
//! [`Signals`]: whole-word mention detection, domain detection, citation
//! extraction, ranked-list detection, keyword-window sentiment, and a 0–100
//! visibility score. Everything here is a pure function of its inputs — no
//! I/O, no clock, no randomness — so identical inputs always produce
//! identical output.

mod citations;
mod mentions;
mod rank;
mod score;
mod sentiment;
mod types;

pub use score::ScoreWeights;
pub use types::{Citation, Sentiment, Signals};

/// Classify one backend response with the default scoring weights.
///
/// `native_citations` carries backend-supplied citation URLs (only one
/// backend surfaces these); when present, markdown-link extraction from the
/// text is skipped entirely.
#[must_use]
pub fn classify(
    text: &str,
    brand_name: &str,
    domain: Option<&str>,
    native_citations: Option<&[String]>,
) -> Signals {
    classify_with_weights(
        text,
        brand_name,
        domain,
        native_citations,
        &ScoreWeights::default(),
    )
}

/// Classify one backend response with explicit scoring weights.
#[must_use]
pub fn classify_with_weights(
    text: &str,
    brand_name: &str,
    domain: Option<&str>,
    native_citations: Option<&[String]>,
    weights: &ScoreWeights,
) -> Signals {
    let mention_positions = mentions::detect_mentions(text, brand_name);
    let mention_count = mention_positions.len();
    let brand_mentioned = mention_count > 0;

    let domain_mentioned = mentions::detect_domain(text, domain);
    let citations = citations::extract_citations(text, brand_name, domain, native_citations);
    let rank_position = rank::detect_rank_position(text, brand_name);
    let sentiment =
        sentiment::classify_sentiment(text, brand_name, &mention_positions, brand_mentioned);

    let has_brand_citation = citations.iter().any(|c| c.brand_related);
    let visibility_score = score::visibility_score(
        brand_mentioned,
        domain_mentioned,
        mention_count,
        rank_position,
        has_brand_citation,
        sentiment,
        weights,
    );

    Signals {
        brand_mentioned,
        domain_mentioned,
        mention_count,
        mention_positions,
        citations,
        sentiment,
        rank_position,
        visibility_score,
    }
}
