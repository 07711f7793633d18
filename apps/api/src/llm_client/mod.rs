//! LLM Client — the single point of entry for all Gemini calls in cvfit.
//!
//! Speaks the Vertex `generateContent` envelope to a bearer-token gateway.
//! One request per call: rate limits and failures are reported, never retried.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 2048;
const TOP_P: f32 = 0.8;
const TOP_K: u32 = 40;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Text at `candidates[0].content.parts[0].text`.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by the assessment backend.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    auth_token: String,
}

impl GeminiClient {
    pub fn new(endpoint: String, auth_token: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Makes a single call to the endpoint, returning the full response envelope.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            system_instruction: system.map(|text| SystemInstruction {
                parts: vec![RequestPart { text }],
            }),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
                top_p: TOP_P,
                top_k: TOP_K,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini request to {} failed: {e}", self.endpoint);
                LlmError::Http(e)
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);

            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited { message: body });
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read Gemini response body: {e}");
            LlmError::Http(e)
        })?;
        let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Gemini returned an unexpected envelope: {e}; raw body: {body}");
            LlmError::InvalidResponse(format!("unexpected envelope: {e}"))
        })?;

        if let Some(usage) = &envelope.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={:?}, candidate_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(envelope)
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<T, LlmError> {
        let response = self.generate(prompt, system).await?;

        let text = match response.text().filter(|t| !t.trim().is_empty()) {
            Some(text) => text,
            None => {
                warn!("Gemini response has no text at candidates[0].content.parts[0]");
                return Err(LlmError::EmptyContent);
            }
        };

        let text = strip_json_fences(text);

        serde_json::from_str(text).map_err(|e| {
            warn!("Failed to parse Gemini response: {e}; raw response: {text}");
            LlmError::Parse(e)
        })
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(|s| s.trim())
                .unwrap_or(stripped)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    use crate::errors::AppError;

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        GeminiClient::new(
            format!("{}/invoke", server.url()),
            "test-token".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20 }
        })
        .to_string()
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"key\": 1}";
        assert_eq!(strip_json_fences(input), "{\"key\": 1}");
    }

    #[test]
    fn test_envelope_text_path() {
        let parsed: GenerateContentResponse = serde_json::from_str(&envelope("hello")).unwrap();
        assert_eq!(parsed.text(), Some("hello"));

        let empty: GenerateContentResponse = serde_json::from_str("{\"candidates\": []}").unwrap();
        assert_eq!(empty.text(), None);
    }

    #[tokio::test]
    async fn test_request_shape_and_bearer_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoke")
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "systemInstruction": { "parts": [{ "text": "be terse" }] },
                "generationConfig": { "maxOutputTokens": 2048, "topK": 40 }
            })))
            .with_status(200)
            .with_body(envelope("{\"ok\": true}"))
            .create_async()
            .await;

        let value: Value = client_for(&server)
            .generate_json("hi", Some("be terse"))
            .await
            .unwrap();

        assert_eq!(value, json!({ "ok": true }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_429_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(429)
            .with_body("quota exhausted")
            .create_async()
            .await;

        let err = client_for(&server).generate("hi", None).await.unwrap_err();
        match err {
            LlmError::RateLimited { message } => assert_eq!(message, "quota exhausted"),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_500_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let err = client_for(&server).generate("hi", None).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_text_is_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(200)
            .with_body("{\"candidates\": [{\"content\": {\"parts\": []}}]}")
            .create_async()
            .await;

        let err = client_for(&server)
            .generate_json::<Value>("hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_non_json_text_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(200)
            .with_body(envelope("I am sorry, I cannot do that."))
            .create_async()
            .await;

        let err = client_for(&server)
            .generate_json::<Value>("hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_hung_upstream_times_out_as_upstream_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept the connection and never answer.
        let silent = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = GeminiClient::new(
            format!("http://{addr}/invoke"),
            "test-token".to_string(),
            Duration::from_millis(300),
        )
        .unwrap();

        let err = client.generate("hi", None).await.unwrap_err();
        assert!(matches!(&err, LlmError::Http(e) if e.is_timeout()), "got {err:?}");
        assert!(matches!(AppError::from(err), AppError::Upstream(_)));

        silent.abort();
    }

    #[tokio::test]
    async fn test_non_envelope_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let err = client_for(&server).generate("hi", None).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
