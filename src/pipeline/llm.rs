//! Chat-completion calls: wire types, the backend seam and the HTTP client.
//!
//! Every request this crate makes (page OCR, image OCR, translation) is one
//! POST to `{base_url}/v1/chat/completions`. Prompt wording lives in
//! [`crate::prompts`]; retrying lives in [`crate::pipeline::retry`]. This
//! module only builds requests, sends them, and turns responses into a
//! [`Completion`] or a [`CompletionError`].
//!
//! ## Backend seam
//!
//! [`CompletionBackend`] is the seam the pipeline talks to. The default
//! implementation is [`HttpCompletionClient`]; tests and embedders can swap
//! in anything else through
//! [`crate::config::PipelineConfigBuilder::backend`].

use crate::config::Credentials;
use crate::error::CompletionError;
use crate::pipeline::encode::PageImage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Plain text, or a list of text/image parts for multimodal messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user turn carrying an instruction followed by one image.
    pub fn user_with_image(text: impl Into<String>, data_uri: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_uri.into() },
                },
            ]),
        }
    }
}

/// Body of `POST /v1/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Text of the first choice, trimmed, plus token usage when reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

// ── Backend seam ─────────────────────────────────────────────────────────

/// Something that can answer a chat-completion request.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        credentials: &Credentials,
        request: &ChatRequest,
    ) -> Result<Completion, CompletionError>;
}

/// `reqwest`-based client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Transport {
                detail: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(
        &self,
        credentials: &Credentials,
        request: &ChatRequest,
    ) -> Result<Completion, CompletionError> {
        let url = credentials.completions_url();
        debug!("POST {} (model={})", url, request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                remote_message: parse_error_body(&body),
            });
        }

        extract_content(&body)
    }
}

fn transport_error(e: reqwest::Error) -> CompletionError {
    let detail = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    CompletionError::Transport { detail }
}

/// `error.message` from an error body. Anything unparseable yields `None`.
pub fn parse_error_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Pull the first choice's text out of a 2xx body.
///
/// The content must be present and non-empty before trimming; a reply of
/// only whitespace is a valid, empty page.
pub fn extract_content(body: &str) -> Result<Completion, CompletionError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            detail: format!("body is not a chat completion: {e}"),
        })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CompletionError::MalformedResponse {
            detail: "no choice with message content".to_string(),
        })?;

    let usage = parsed.usage.unwrap_or_default();
    Ok(Completion {
        content: content.trim().to_string(),
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    })
}

// ── Request builders ─────────────────────────────────────────────────────

/// Multimodal request for one image: system prompt, then instruction + image.
pub fn build_vision_request(
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    data_uri: &str,
    temperature: Option<f32>,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_image(user_prompt, data_uri),
        ],
        temperature,
    }
}

/// Request transcribing one rendered PDF page.
pub fn build_page_request(
    model: &str,
    image: &PageImage,
    system_prompt: Option<&str>,
    temperature: Option<f32>,
) -> ChatRequest {
    build_vision_request(
        model,
        system_prompt.unwrap_or(crate::prompts::PDF_PAGE_SYSTEM_PROMPT),
        crate::prompts::PDF_PAGE_USER_PROMPT,
        &image.data_uri,
        temperature,
    )
}

/// Single attempt at transcribing one page. Retrying is the caller's job.
pub async fn recognize_page(
    backend: &dyn CompletionBackend,
    credentials: &Credentials,
    model: &str,
    image: &PageImage,
    system_prompt: Option<&str>,
    temperature: Option<f32>,
) -> Result<Completion, CompletionError> {
    let request = build_page_request(model, image, system_prompt, temperature);
    let completion = backend.complete(credentials, &request).await?;
    debug!(
        "Page {}: {} input tokens, {} output tokens",
        image.page_number, completion.prompt_tokens, completion.completion_tokens
    );
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vision_request_matches_wire_format() {
        let req = build_vision_request("gpt-4o-mini", "sys", "read this", "data:image/jpeg;base64,AAAA", None);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": [
                        {"type": "text", "text": "read this"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn temperature_is_sent_when_set() {
        let req = ChatRequest {
            model: "m".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.5),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["temperature"], json!(0.5));
    }

    #[test]
    fn page_request_uses_override_prompt() {
        let image = PageImage {
            page_number: 1,
            width: 1,
            height: 1,
            data_uri: "data:image/jpeg;base64,AA".into(),
        };
        let req = build_page_request("m", &image, Some("custom"), None);
        assert_eq!(req.messages[0], ChatMessage::system("custom"));
    }

    #[test]
    fn error_body_message_is_extracted() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        assert_eq!(parse_error_body(body).as_deref(), Some("Rate limit reached"));
        assert_eq!(parse_error_body("<html>502</html>"), None);
        assert_eq!(parse_error_body(r#"{"error":"flat"}"#), None);
        assert_eq!(parse_error_body(""), None);
    }

    #[test]
    fn content_is_trimmed_and_usage_read() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  # Title\n\n"}}],
                       "usage":{"prompt_tokens":812,"completion_tokens":40}}"#;
        let c = extract_content(body).unwrap();
        assert_eq!(c.content, "# Title");
        assert_eq!((c.prompt_tokens, c.completion_tokens), (812, 40));
    }

    #[test]
    fn whitespace_only_content_is_valid_but_empty() {
        let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
        assert_eq!(extract_content(body).unwrap().content, "");
    }

    #[test]
    fn missing_content_is_malformed() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":""}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{}"#,
            "not json",
        ] {
            assert!(
                matches!(extract_content(body), Err(CompletionError::MalformedResponse { .. })),
                "body: {body}"
            );
        }
    }
}
