use serde::{Deserialize, Serialize};

/// Sentiment of the response toward the brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    NotMentioned,
}

impl Sentiment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
            Sentiment::NotMentioned => "not_mentioned",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One citation extracted from a response (backend-native or markdown link).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    /// Whether the citation's URL or label references the brand or its domain.
    pub brand_related: bool,
}

/// Structured signals extracted from one backend response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub brand_mentioned: bool,
    pub domain_mentioned: bool,
    pub mention_count: usize,
    /// Character offsets of each whole-word brand mention, ascending.
    pub mention_positions: Vec<usize>,
    pub citations: Vec<Citation>,
    pub sentiment: Sentiment,
    /// Ordinal of the first ranked-list line containing the brand, if any.
    pub rank_position: Option<u32>,
    /// Per-response visibility score in `[0, 100]`.
    pub visibility_score: u8,
}

impl Signals {
    /// The sentinel classification recorded when a backend call fails:
    /// zero score, no mention, empty signals. Aggregation treats it like
    /// any other result row.
    #[must_use]
    pub fn not_mentioned() -> Self {
        Self {
            brand_mentioned: false,
            domain_mentioned: false,
            mention_count: 0,
            mention_positions: Vec::new(),
            citations: Vec::new(),
            sentiment: Sentiment::NotMentioned,
            rank_position: None,
            visibility_score: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_serializes_as_snake_case() {
        let json = serde_json::to_string(&Sentiment::NotMentioned).unwrap();
        assert_eq!(json, "\"not_mentioned\"");
    }

    #[test]
    fn not_mentioned_sentinel_is_all_zeroes() {
        let signals = Signals::not_mentioned();
        assert!(!signals.brand_mentioned);
        assert_eq!(signals.visibility_score, 0);
        assert_eq!(signals.sentiment, Sentiment::NotMentioned);
        assert!(signals.citations.is_empty());
        assert!(signals.rank_position.is_none());
    }
}
