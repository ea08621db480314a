//! Client for the hosted text-generation API.
//!
//! One request per generation, one 30-second deadline, no retries. Success
//! and failure both come back through the uniform [`GenerationResult`]
//! envelope; callers treat a set `error` as authoritative.

use crate::config::{CREDENTIAL_ENV, ServerConfig};
use crate::error::ServiceError;
use crate::metrics::METRICS;
use crate::model::GenerationResult;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are a React component generator. Generate a React component based on the user's description. Return ONLY the code, starting with 'use client' if needed. Use Tailwind CSS for styling. Ensure the code is production-ready and functional. Do NOT include any additional explanation, thinking, or comments—just the code.";

// Generation parameters are fixed; prompts are the only variable input.
const TEMPERATURE: f64 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 2000;
const TOP_P: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct GenerationClient {
    config: Arc<ServerConfig>,
    client: reqwest::Client,
}

impl GenerationClient {
    pub fn new(config: Arc<ServerConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Generate component code for the prompt.
    pub async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.request_completion(prompt).await {
            Ok(code) => GenerationResult::ok(code),
            Err(err) => {
                tracing::error!(category = err.category(), error = %err, "code generation failed");
                METRICS.record_upstream_error(err.category());
                GenerationResult::failure(err.to_string())
            }
        }
    }

    async fn request_completion(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self.credential()?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ServiceError::InvalidPrompt(
                "Prompt cannot be empty".to_string(),
            ));
        }

        tracing::debug!(
            endpoint = %self.config.generation_url,
            prompt_len = prompt.len(),
            "calling generation API"
        );

        let response = self
            .client
            .post(&self.config.generation_url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<UpstreamErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .map(|detail| detail.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ServiceError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(|_| ServiceError::UpstreamShape)?;
        let text = body.first_text().ok_or(ServiceError::UpstreamShape)?;
        let code = text.trim().to_string();
        tracing::debug!(code_len = code.len(), "generation API returned code");
        Ok(code)
    }

    /// Streaming variant: returns the raw upstream response for callers that
    /// consume bytes incrementally. The main generation flow never uses it.
    pub async fn generate_streaming(
        &self,
        prompt: &str,
    ) -> Result<reqwest::Response, ServiceError> {
        let api_key = self.credential()?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ServiceError::InvalidPrompt(
                "Prompt cannot be empty".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.config.generation_url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::UpstreamStatus {
                status: status.as_u16(),
                message: "Unknown error".to_string(),
            });
        }
        Ok(response)
    }

    fn credential(&self) -> Result<&str, ServiceError> {
        self.config
            .api_key()
            .ok_or(ServiceError::MissingCredential(CREDENTIAL_ENV))
    }

    fn transport_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::UpstreamTimeout(self.config.request_timeout.as_secs())
        } else {
            ServiceError::UpstreamTransport(err.to_string())
        }
    }
}

fn request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{
                "text": format!("{SYSTEM_PROMPT}\n\nGenerate a React component for: {prompt}"),
            }],
        }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
            "topP": TOP_P,
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ContentPart>>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    error: Option<UpstreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}
