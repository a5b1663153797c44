//! Anthropic messages adapter.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{decode_response, require_api_key, ProviderSettings};
use crate::error::BackendError;
use crate::types::{Backend, BackendResponse};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// `POST {base}/v1/messages` with the `x-api-key` / `anthropic-version`
/// header pair.
///
/// The answer is the first content block when it is a `text` block; any
/// other leading block kind yields an empty response text.
pub(crate) async fn query(
    http: &Client,
    provider: &ProviderSettings,
    max_tokens: u32,
    prompt: &str,
) -> Result<BackendResponse, BackendError> {
    let api_key = require_api_key(provider, Backend::Anthropic)?;
    let url = format!("{}/v1/messages", provider.base_url.trim_end_matches('/'));

    let body = MessagesRequest {
        model: &provider.model,
        max_tokens,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
    };

    let response = http
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await?;
    let parsed: MessagesResponse = decode_response(Backend::Anthropic, response).await?;

    let text = parsed
        .content
        .into_iter()
        .next()
        .filter(|block| block.kind == "text")
        .and_then(|block| block.text)
        .unwrap_or_default();

    Ok(BackendResponse {
        text,
        citations: Vec::new(),
    })
}
