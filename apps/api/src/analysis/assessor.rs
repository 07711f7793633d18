//! Assessment backends — pluggable, trait-based producers of an `AnalysisResult`.
//!
//! `LlmAssessor` (default) asks Gemini for the structured assessment.
//! `KeywordAssessor` scores by skill-vocabulary overlap, fully offline.
//!
//! `AppState` holds an `Arc<dyn Assessor>` chosen once at startup via
//! `ASSESSOR_BACKEND`. There is no runtime fallback between backends: an LLM
//! failure is reported to the caller, never papered over with a heuristic.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::analysis::keywords::keyword_assessment;
use crate::analysis::models::{AnalysisResult, RawAssessment};
use crate::analysis::prompts::build_analysis_prompt;
use crate::config::{AssessorBackend, Config};
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::GeminiClient;

/// Implement this to swap backends without touching the handler or pipeline.
#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess(&self, job_description: &str, cv: &str) -> Result<AnalysisResult, AppError>;

    /// "llm" | "keyword", for logs.
    fn backend_name(&self) -> &'static str;
}

/// Builds the backend selected by configuration.
pub fn build_assessor(config: &Config) -> Result<Arc<dyn Assessor>> {
    match config.assessor_backend {
        AssessorBackend::Llm => {
            let token = config
                .gemini_auth_token
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_AUTH_TOKEN is required for the llm backend"))?;
            let client = GeminiClient::new(config.gemini_endpoint.clone(), token, config.llm_timeout)?;
            info!("LLM assessor initialized (endpoint: {})", client.endpoint());
            Ok(Arc::new(LlmAssessor::new(client)))
        }
        AssessorBackend::Keyword => {
            info!("Keyword assessor initialized (no LLM calls will be made)");
            Ok(Arc::new(KeywordAssessor))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmAssessor
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmAssessor {
    llm: GeminiClient,
}

impl LlmAssessor {
    pub fn new(llm: GeminiClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Assessor for LlmAssessor {
    async fn assess(&self, job_description: &str, cv: &str) -> Result<AnalysisResult, AppError> {
        let prompt = build_analysis_prompt(job_description, cv);

        let raw: RawAssessment = self
            .llm
            .generate_json(&prompt, Some(JSON_ONLY_SYSTEM))
            .await?;

        Ok(raw.into())
    }

    fn backend_name(&self) -> &'static str {
        "llm"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordAssessor
// ────────────────────────────────────────────────────────────────────────────

pub struct KeywordAssessor;

#[async_trait]
impl Assessor for KeywordAssessor {
    async fn assess(&self, job_description: &str, cv: &str) -> Result<AnalysisResult, AppError> {
        Ok(keyword_assessment(job_description, cv))
    }

    fn backend_name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn envelope(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    async fn assessor_with(status: usize, body: String) -> (mockito::ServerGuard, LlmAssessor) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;
        let client = GeminiClient::new(
            format!("{}/invoke", server.url()),
            "token".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        (server, LlmAssessor::new(client))
    }

    #[tokio::test]
    async fn test_fenced_payload_is_parsed_and_clamped() {
        let payload = "```json\n{\"candidateStrengths\":[],\"candidateWeaknesses\":[],\"alignmentScore\":150,\"keyMatches\":[],\"recommendations\":[],\"summary\":\"x\"}\n```";
        let (_server, assessor) = assessor_with(200, envelope(payload)).await;

        let result = assessor.assess("job", "cv").await.unwrap();
        assert_eq!(result.alignment_score, 100);
        assert_eq!(result.summary, "x");
    }

    #[tokio::test]
    async fn test_negative_score_clamped_to_zero() {
        let payload = json!({
            "candidateStrengths": ["Go"],
            "candidateWeaknesses": ["No Rust"],
            "alignmentScore": -10,
            "keyMatches": ["go"],
            "recommendations": ["Pair programming"],
            "summary": "Weak"
        })
        .to_string();
        let (_server, assessor) = assessor_with(200, envelope(&payload)).await;

        let result = assessor.assess("job", "cv").await.unwrap();
        assert_eq!(result.alignment_score, 0);
        assert_eq!(result.candidate_strengths, vec!["Go"]);
    }

    #[tokio::test]
    async fn test_missing_required_field_is_upstream_error() {
        let payload = json!({ "candidateStrengths": ["Go"], "alignmentScore": 50 }).to_string();
        let (_server, assessor) = assessor_with(200, envelope(&payload)).await;

        let err = assessor.assess("job", "cv").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_and_server_error_are_distinct() {
        let (_s1, limited) = assessor_with(429, "slow down".to_string()).await;
        let (_s2, broken) = assessor_with(500, "boom".to_string()).await;

        let limited = limited.assess("job", "cv").await.unwrap_err();
        let broken = broken.assess("job", "cv").await.unwrap_err();
        assert!(matches!(limited, AppError::UpstreamRateLimited(_)));
        assert!(matches!(broken, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_keyword_assessor_never_fails() {
        let result = KeywordAssessor.assess("docker", "docker").await.unwrap();
        assert_eq!(result.alignment_score, 95);
        assert_eq!(KeywordAssessor.backend_name(), "keyword");
    }

    #[test]
    fn test_build_assessor_respects_backend() {
        let config = Config::from_lookup(|key: &str| match key {
            "ASSESSOR_BACKEND" => Some("keyword".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(build_assessor(&config).unwrap().backend_name(), "keyword");

        let config = Config::from_lookup(|key: &str| match key {
            "GEMINI_AUTH_TOKEN" => Some("t".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(build_assessor(&config).unwrap().backend_name(), "llm");
    }
}
