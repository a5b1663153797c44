//! Perplexity adapter — the one backend that surfaces native citations.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{decode_response, require_api_key, ProviderSettings};
use crate::error::BackendError;
use crate::types::{Backend, BackendResponse};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    /// Source URLs the answer was grounded on; passed to the classifier
    /// verbatim, which then skips markdown-link extraction.
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `POST {base}/chat/completions` with a single user message.
pub(crate) async fn query(
    http: &Client,
    provider: &ProviderSettings,
    max_tokens: u32,
    prompt: &str,
) -> Result<BackendResponse, BackendError> {
    let api_key = require_api_key(provider, Backend::Perplexity)?;
    let url = format!(
        "{}/chat/completions",
        provider.base_url.trim_end_matches('/')
    );

    let body = ChatRequest {
        model: &provider.model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens,
    };

    let response = http.post(&url).bearer_auth(api_key).json(&body).send().await?;
    let parsed: ChatResponse = decode_response(Backend::Perplexity, response).await?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    Ok(BackendResponse {
        text,
        citations: parsed.citations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citations_default_to_empty() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"hello"}}]}"#,
        )
        .unwrap();
        assert!(parsed.citations.is_empty());
    }

    #[test]
    fn citations_are_parsed_when_present() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[],"citations":["https://acme.com","https://example.org"]}"#,
        )
        .unwrap();
        assert_eq!(parsed.citations.len(), 2);
    }
}
