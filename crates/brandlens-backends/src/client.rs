//! HTTP client shared by the four backend adapters.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::BackendError;
use crate::retry::retry_with_backoff;
use crate::types::{Backend, BackendResponse};
use crate::{anthropic, gemini, openai, perplexity};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Connection settings for one backend: credentials, endpoint, model.
///
/// `base_url` exists so tests can point an adapter at a mock server.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderSettings {
    fn with_defaults(api_key: Option<String>, backend: Backend, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.to_owned(),
            model: backend.default_model().to_owned(),
        }
    }
}

/// Settings for all four backends plus shared request parameters.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub perplexity: ProviderSettings,
    pub gemini: ProviderSettings,
    /// Completion budget sent to every backend.
    pub max_tokens: u32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            openai: ProviderSettings::with_defaults(None, Backend::OpenAi, DEFAULT_OPENAI_BASE_URL),
            anthropic: ProviderSettings::with_defaults(
                None,
                Backend::Anthropic,
                DEFAULT_ANTHROPIC_BASE_URL,
            ),
            perplexity: ProviderSettings::with_defaults(
                None,
                Backend::Perplexity,
                DEFAULT_PERPLEXITY_BASE_URL,
            ),
            gemini: ProviderSettings::with_defaults(None, Backend::Gemini, DEFAULT_GEMINI_BASE_URL),
            max_tokens: 2048,
        }
    }
}

impl BackendSettings {
    /// Build settings with API keys taken from the application config and
    /// production endpoints/models for everything else.
    #[must_use]
    pub fn from_app_config(config: &brandlens_core::AppConfig) -> Self {
        let mut settings = Self::default();
        settings.openai.api_key = config.openai_api_key.clone();
        settings.anthropic.api_key = config.anthropic_api_key.clone();
        settings.perplexity.api_key = config.perplexity_api_key.clone();
        settings.gemini.api_key = config.gemini_api_key.clone();
        settings
    }

    #[must_use]
    pub const fn provider(&self, backend: Backend) -> &ProviderSettings {
        match backend {
            Backend::OpenAi => &self.openai,
            Backend::Anthropic => &self.anthropic,
            Backend::Perplexity => &self.perplexity,
            Backend::Gemini => &self.gemini,
        }
    }
}

/// Client over the closed set of backends.
///
/// Owns one `reqwest::Client`; per-call failures never escape as panics,
/// only as [`BackendError`] values local to that call.
pub struct BackendClient {
    http: Client,
    settings: BackendSettings,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl BackendClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        settings: BackendSettings,
        timeout_secs: u64,
        max_retries: u32,
        retry_backoff_base_ms: u64,
    ) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("brandlens/0.1 (visibility-scan)")
            .build()?;

        Ok(Self {
            http,
            settings,
            max_retries,
            retry_backoff_base_ms,
        })
    }

    /// Creates a client with keys, timeout and retry policy from the
    /// application config.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_app_config(config: &brandlens_core::AppConfig) -> Result<Self, BackendError> {
        Self::new(
            BackendSettings::from_app_config(config),
            config.backend_request_timeout_secs,
            config.backend_max_retries,
            config.backend_retry_backoff_base_ms,
        )
    }

    /// Sends `prompt` to one backend and returns its answer.
    ///
    /// Transient failures (timeouts, connect errors, 5xx) are retried with
    /// back-off up to the configured attempt cap; everything else surfaces
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the key is missing, the request fails,
    /// the backend answers non-2xx, or the body cannot be decoded.
    pub async fn query(
        &self,
        backend: Backend,
        prompt: &str,
    ) -> Result<BackendResponse, BackendError> {
        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.dispatch(backend, prompt)
        })
        .await
    }

    async fn dispatch(
        &self,
        backend: Backend,
        prompt: &str,
    ) -> Result<BackendResponse, BackendError> {
        let provider = self.settings.provider(backend);
        let max_tokens = self.settings.max_tokens;
        match backend {
            Backend::OpenAi => openai::query(&self.http, provider, max_tokens, prompt).await,
            Backend::Anthropic => anthropic::query(&self.http, provider, max_tokens, prompt).await,
            Backend::Perplexity => {
                perplexity::query(&self.http, provider, max_tokens, prompt).await
            }
            Backend::Gemini => gemini::query(&self.http, provider, max_tokens, prompt).await,
        }
    }
}

/// Returns the provider's API key or the missing-key error for `backend`.
pub(crate) fn require_api_key(
    provider: &ProviderSettings,
    backend: Backend,
) -> Result<&str, BackendError> {
    provider
        .api_key
        .as_deref()
        .ok_or(BackendError::MissingApiKey(backend.as_str()))
}

/// Asserts a 2xx status and decodes the body into `T`.
///
/// Non-2xx statuses become [`BackendError::Api`] carrying a body excerpt so
/// quota/auth failures stay diagnosable from logs.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    backend: Backend,
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::Api {
            backend: backend.as_str(),
            status: status.as_u16(),
            message: excerpt(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Deserialize {
        context: backend.as_str().to_owned(),
        source: e,
    })
}

/// First 200 characters of an error body, whitespace-collapsed.
fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_production_endpoints() {
        let settings = BackendSettings::default();
        assert_eq!(settings.openai.base_url, "https://api.openai.com");
        assert_eq!(settings.gemini.model, "gemini-2.0-flash-lite");
        assert_eq!(settings.max_tokens, 2048);
        assert!(settings.anthropic.api_key.is_none());
    }

    #[test]
    fn provider_lookup_matches_backend() {
        let settings = BackendSettings::default();
        for backend in Backend::ALL {
            assert_eq!(
                settings.provider(backend).model,
                backend.default_model(),
                "model mismatch for {backend}"
            );
        }
    }

    #[test]
    fn require_api_key_errors_when_absent() {
        let provider = ProviderSettings {
            api_key: None,
            base_url: "https://api.openai.com".to_owned(),
            model: "gpt-4o-mini".to_owned(),
        };
        let err = require_api_key(&provider, Backend::OpenAi).unwrap_err();
        assert!(matches!(err, BackendError::MissingApiKey("openai")));
    }

    #[test]
    fn excerpt_collapses_and_truncates() {
        let long = format!("word\n\n  word {}", "x".repeat(500));
        let e = excerpt(&long);
        assert!(e.starts_with("word word"));
        assert_eq!(e.chars().count(), 200);
    }
}
