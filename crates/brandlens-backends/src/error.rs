use thiserror::Error;

/// Errors returned by the backend adapters.
///
/// Every variant is local to a single `query` call; the orchestrator
/// downgrades them to fallback results rather than letting them abort
/// sibling calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{backend} API error (status {status}): {message}")]
    Api {
        backend: &'static str,
        status: u16,
        message: String,
    },

    /// No API key is configured for the backend.
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored backend tag did not match any known variant.
    #[error("unknown backend tag: {0}")]
    UnknownBackend(String),
}
