//! OpenAI chat-completions adapter.

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
    temperature: f32,
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

/// `POST {base}/v1/chat/completions` with a single user message.
///
/// An empty or missing `content` yields an empty response text rather than
/// an error; the classifier scores it as not-mentioned.
pub(crate) async fn query(
    http: &Client,
    provider: &ProviderSettings,
    max_tokens: u32,
    prompt: &str,
) -> Result<BackendResponse, BackendError> {
    let api_key = require_api_key(provider, Backend::OpenAi)?;
    let url = format!(
        "{}/v1/chat/completions",
        provider.base_url.trim_end_matches('/')
    );

    let body = ChatRequest {
        model: &provider.model,
        messages: [ChatMessage {
            role: "user",
            content: prompt,
        }],
        max_tokens,
        temperature: 0.7,
    };

    let response = http.post(&url).bearer_auth(api_key).json(&body).send().await?;
    let parsed: ChatResponse = decode_response(Backend::OpenAi, response).await?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    Ok(BackendResponse {
        text,
        citations: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_payload_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [ChatMessage {
                role: "user",
                content: "which CRM is best?",
            }],
            max_tokens: 2048,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 2048);
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());

        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
