//! Gemini generate-content adapter.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{decode_response, require_api_key, ProviderSettings};
use crate::error::BackendError;
use crate::types::{Backend, BackendResponse};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// `POST {base}/v1beta/models/{model}:generateContent` with the API key as
/// a query parameter.
///
/// The answer is the concatenation of the first candidate's text parts.
pub(crate) async fn query(
    http: &Client,
    provider: &ProviderSettings,
    _max_tokens: u32,
    prompt: &str,
) -> Result<BackendResponse, BackendError> {
    let api_key = require_api_key(provider, Backend::Gemini)?;
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        provider.base_url.trim_end_matches('/'),
        provider.model
    );

    let body = GenerateRequest {
        contents: [RequestContent {
            parts: [RequestPart { text: prompt }],
        }],
    };

    let response = http
        .post(&url)
        .query(&[("key", api_key)])
        .json(&body)
        .send()
        .await?;
    let parsed: GenerateResponse = decode_response(Backend::Gemini, response).await?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(BackendResponse {
        text,
        citations: Vec::new(),
    })
}
