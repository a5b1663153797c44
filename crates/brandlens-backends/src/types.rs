use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// The closed set of text-generation backends a scan queries.
///
/// The set is fixed at compile time; adding a backend means adding a variant
/// here plus its wire module, not registering a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAi,
    Anthropic,
    Perplexity,
    Gemini,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::OpenAi,
        Backend::Anthropic,
        Backend::Perplexity,
        Backend::Gemini,
    ];

    /// Stable tag used in the database and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Anthropic => "anthropic",
            Backend::Perplexity => "perplexity",
            Backend::Gemini => "gemini",
        }
    }

    /// Human-facing product name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Backend::OpenAi => "ChatGPT",
            Backend::Anthropic => "Claude",
            Backend::Perplexity => "Perplexity",
            Backend::Gemini => "Gemini",
        }
    }

    /// Model identifier sent on the wire by default.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Backend::OpenAi => "gpt-4o-mini",
            Backend::Anthropic => "claude-haiku-4-5-20251001",
            Backend::Perplexity => "sonar",
            Backend::Gemini => "gemini-2.0-flash-lite",
        }
    }

    /// Fixed aggregation weight. Perplexity answers carry native citations
    /// and weigh slightly more in the overall score.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Backend::Perplexity => 1.2,
            Backend::OpenAi | Backend::Anthropic | Backend::Gemini => 1.0,
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Backend::OpenAi),
            "anthropic" => Ok(Backend::Anthropic),
            "perplexity" => Ok(Backend::Perplexity),
            "gemini" => Ok(Backend::Gemini),
            other => Err(BackendError::UnknownBackend(other.to_owned())),
        }
    }
}

/// Per-backend aggregation weights, substitutable in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendWeights {
    pub openai: f64,
    pub anthropic: f64,
    pub perplexity: f64,
    pub gemini: f64,
}

impl Default for BackendWeights {
    fn default() -> Self {
        Self {
            openai: Backend::OpenAi.default_weight(),
            anthropic: Backend::Anthropic.default_weight(),
            perplexity: Backend::Perplexity.default_weight(),
            gemini: Backend::Gemini.default_weight(),
        }
    }
}

impl BackendWeights {
    #[must_use]
    pub const fn weight_for(&self, backend: Backend) -> f64 {
        match backend {
            Backend::OpenAi => self.openai,
            Backend::Anthropic => self.anthropic,
            Backend::Perplexity => self.perplexity,
            Backend::Gemini => self.gemini,
        }
    }
}

/// One backend's answer to one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    /// Backend-native citation URLs; empty for backends without the feature.
    pub citations: Vec<String>,
}
