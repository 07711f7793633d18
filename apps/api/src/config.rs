use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Gateway fronting Gemini 1.5 Flash `generateContent`.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://intertest.woolf.engineering/invoke";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
/// Two base64-encoded PDFs plus JSON framing.
const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Which assessment backend serves `/analyze`. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessorBackend {
    Llm,
    Keyword,
}

impl FromStr for AssessorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" | "gemini" => Ok(AssessorBackend::Llm),
            "keyword" => Ok(AssessorBackend::Keyword),
            other => bail!("ASSESSOR_BACKEND must be 'llm' or 'keyword', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub assessor_backend: AssessorBackend,
    /// Present whenever `assessor_backend` is `Llm`.
    pub gemini_auth_token: Option<String>,
    pub gemini_endpoint: String,
    pub llm_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let assessor_backend = match lookup("ASSESSOR_BACKEND") {
            Some(raw) => raw.parse()?,
            None => AssessorBackend::Llm,
        };

        let gemini_auth_token = lookup("GEMINI_AUTH_TOKEN").filter(|t| !t.trim().is_empty());
        if assessor_backend == AssessorBackend::Llm && gemini_auth_token.is_none() {
            bail!(
                "Required environment variable 'GEMINI_AUTH_TOKEN' is not set \
                 (set ASSESSOR_BACKEND=keyword to run without the LLM)"
            );
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 3000u16).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            assessor_backend,
            gemini_auth_token,
            gemini_endpoint: lookup("GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
            llm_timeout: Duration::from_secs(
                parse_or(&lookup, "LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)
                .context("MAX_BODY_BYTES must be a byte count")?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        None => Ok(default),
    }
}
