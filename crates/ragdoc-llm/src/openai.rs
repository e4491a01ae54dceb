//! Chat-completions client for OpenAI-compatible endpoints (OpenAI, Groq).

use std::time::Duration;

use ragdoc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::messages::ChatMessage;

const ERROR_EXCERPT_CHARS: usize = 300;

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    provider: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))
}

impl OpenAiCompatibleClient {
    pub fn new(
        http: reqwest::Client,
        provider: &'static str,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        temperature: Option<f32>,
    ) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidConfig(format!("{}_API_KEY is missing", provider.to_ascii_uppercase())))?;
        if model.trim().is_empty() { return Err(Error::InvalidInput("model name must not be empty".into())); }
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            provider,
        })
    }

    pub fn model(&self) -> &str { &self.model }
    pub fn endpoint(&self) -> &str { &self.endpoint }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatCompletionRequest { model: &self.model, messages, temperature: self.temperature };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider(self.provider, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| Error::provider(self.provider, e))?;
        if !status.is_success() {
            return Err(Error::provider(self.provider, format!("HTTP {}: {}", status, excerpt(&text))));
        }
        parse_completion(self.provider, &text)
    }
}

/// Extract the first choice's text from a chat-completions response body.
pub fn parse_completion(provider: &str, body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::provider(provider, format!("malformed response ({}): {}", e, excerpt(body))))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::provider(provider, "response contained no answer"))
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(ERROR_EXCERPT_CHARS).collect();
    if text.chars().count() > ERROR_EXCERPT_CHARS { out.push('…'); }
    out
}
