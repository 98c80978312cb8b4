//! HTTP client for the LLM provider (§6): an OpenAI-compatible
//! chat-completion caller built on a single `reqwest::Client`, with
//! timeout and rate-limit error mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::OntologyError;

/// Everything a caller gets back from one LLM round trip: the raw content
/// (parsed by the caller with [`crate::llm::parse_json_envelope`]) plus
/// token accounting.
#[derive(Debug, Clone)]
pub struct GenerateResponseOutcome {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// The LLM client contract consumed by every classifier and by Phases 3-5
/// (§6). `streaming` is accepted for interface completeness but every
/// caller in this core passes `false` — none of the phases need a
/// partial/streamed response.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_response(
        &self,
        prompt: &str,
        system: &str,
        temperature: f64,
        streaming: bool,
    ) -> Result<GenerateResponseOutcome, OntologyError>;

    fn get_model(&self) -> String;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    stream: bool,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

/// OpenAI-compatible HTTP implementation of [`LlmClient`]. Works against
/// OpenAI, Azure OpenAI, and any self-hosted OpenAI-compatible gateway.
pub struct HttpLlmClient {
    http_client: Client,
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl HttpLlmClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build LLM HTTP client");

        Self {
            http_client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate_response(
        &self,
        prompt: &str,
        system: &str,
        temperature: f64,
        streaming: bool,
    ) -> Result<GenerateResponseOutcome, OntologyError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature,
            stream: streaming,
            response_format: ResponseFormat { r#type: "json_object".to_string() },
        };

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        tracing::debug!(url = %url, model = %self.model, "calling LLM API");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OntologyError::Timeout(self.timeout.as_secs())
                } else {
                    OntologyError::Llm(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(OntologyError::RateLimited(retry_after));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OntologyError::Llm(format!("status {status}: {body}")));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OntologyError::Llm("empty choices array".to_string()))?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(GenerateResponseOutcome {
            content: choice.message.content,
            prompt_tokens,
            completion_tokens,
        })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
