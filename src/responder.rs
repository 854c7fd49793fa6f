//! External responder boundary
//!
//! The dialogue layer decides *whether* and *with what context* to call
//! the remote model; this module owns the how. Uses a long-lived
//! reqwest::Client for connection pooling.

use crate::error::ResponderError;
use crate::memory::TurnRole;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Per-attempt request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Transient failures are retried this many times after the first
/// attempt, sleeping 1 s, 2 s, 4 s between tries.
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Everything the external model is allowed to see for one turn.
#[derive(Debug, Clone)]
pub struct ResponderRequest {
    /// System-role instruction block.
    pub system_instruction: String,
    /// Bounded recent conversation history, oldest first.
    pub history: Vec<(TurnRole, String)>,
    /// The approved user turn.
    pub user_turn: String,
    /// Compact summary of the computed projection.
    pub projection_summary: Vec<String>,
}

/// Boundary trait for the remote large-language-model provider.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: &ResponderRequest) -> Result<String, ResponderError>;
}

/// Offline responder for tests and keyless runs.
pub struct MockResponder;

#[async_trait]
impl Responder for MockResponder {
    async fn respond(&self, request: &ResponderRequest) -> Result<String, ResponderError> {
        Ok(format!(
            "Based on your projection, here is a thought on \"{}\".",
            request.user_turn
        ))
    }
}

enum AttemptError {
    /// Server-side or timeout failure worth another try.
    Transient(ResponderError),
    /// Surfaces immediately: credentials, rate limits, client errors.
    Fatal(ResponderError),
}

/// Gemini-backed responder (connection-pooled).
pub struct GeminiResponder {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiResponder {
    pub fn new(api_key: String) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ResponderError::Failed(format!("client build failed: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent".to_string(),
        })
    }

    fn build_prompt(request: &ResponderRequest) -> String {
        let mut prompt = String::new();

        if !request.projection_summary.is_empty() {
            prompt.push_str("The user's wealth projection:\n");
            for line in &request.projection_summary {
                prompt.push_str("- ");
                prompt.push_str(line);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        if !request.history.is_empty() {
            prompt.push_str("Recent conversation:\n");
            for (role, content) in &request.history {
                let speaker = match role {
                    TurnRole::User => "User",
                    TurnRole::Agent => "Coach",
                };
                prompt.push_str(&format!("- {}: {}\n", speaker, content));
            }
            prompt.push('\n');
        }

        prompt.push_str("Answer this question: ");
        prompt.push_str(&request.user_turn);
        prompt
    }

    async fn attempt(&self, request: &ResponderRequest) -> Result<String, AttemptError> {
        let url = format!("{}?key={}", self.base_url, self.api_key);

        let payload = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(request),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptError::Transient(ResponderError::Timeout)
                } else {
                    AttemptError::Transient(ResponderError::Failed(format!(
                        "request failed: {}",
                        e
                    )))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Responder returned error status");
            return Err(categorize_status(status, body));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            AttemptError::Fatal(ResponderError::Failed(format!("parse error: {}", e)))
        })?;

        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| AttemptError::Fatal(ResponderError::Failed("empty response".into())))
    }
}

fn categorize_status(status: StatusCode, body: String) -> AttemptError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AttemptError::Fatal(ResponderError::InvalidCredential)
        }
        StatusCode::TOO_MANY_REQUESTS => AttemptError::Fatal(ResponderError::RateLimited),
        s if s.is_server_error() => {
            AttemptError::Transient(ResponderError::Failed(format!("{}: {}", s, body)))
        }
        s => AttemptError::Fatal(ResponderError::Failed(format!("{}: {}", s, body))),
    }
}

#[async_trait]
impl Responder for GeminiResponder {
    async fn respond(&self, request: &ResponderRequest) -> Result<String, ResponderError> {
        if self.api_key.is_empty() {
            return Err(ResponderError::InvalidCredential);
        }

        let mut backoff = BASE_BACKOFF;

        for attempt in 0..=MAX_RETRIES {
            match self.attempt(request).await {
                Ok(answer) => {
                    if attempt > 0 {
                        info!(attempt, "Responder recovered after retries");
                    }
                    return Ok(answer);
                }
                Err(AttemptError::Fatal(e)) => {
                    warn!(error = %e, "Responder failed, not retrying");
                    return Err(e);
                }
                Err(AttemptError::Transient(e)) => {
                    if attempt == MAX_RETRIES {
                        warn!(error = %e, "Responder failed after final retry");
                        return Err(e);
                    }
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Responder call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }

        unreachable!("retry loop returns on the final attempt")
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
