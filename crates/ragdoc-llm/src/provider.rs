use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ragdoc_core::config::ProviderSettings;
use ragdoc_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::messages::ChatMessage;
use crate::openai::{http_client, OpenAiCompatibleClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    Groq,
    OpenAi,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" | "open_ai" | "open-ai" => Ok(Self::OpenAi),
            other => Err(Error::InvalidInput(format!("unknown model provider '{}'", other))),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = Error;
    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Provider> for String {
    fn from(p: Provider) -> Self { p.to_string() }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Groq => "Groq",
            Self::OpenAi => "OpenAI",
        })
    }
}

/// Opaque "messages in, text out" capability of a hosted model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> Provider;
    fn model(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Single-turn convenience used for grounded prompts.
    async fn answer(&self, prompt: &str) -> Result<String> {
        self.complete(&[ChatMessage::User(prompt.to_string())]).await
    }
}

pub struct GroqModel {
    client: OpenAiCompatibleClient,
}

impl GroqModel {
    pub fn new(http: reqwest::Client, settings: &ProviderSettings, model: &str, temperature: Option<f32>) -> Result<Self> {
        let client = OpenAiCompatibleClient::new(http, "groq", &settings.groq_base_url, settings.groq_api_key.as_deref(), model, temperature)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LanguageModel for GroqModel {
    fn provider(&self) -> Provider { Provider::Groq }
    fn model(&self) -> &str { self.client.model() }
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> { self.client.complete(messages).await }
}

pub struct OpenAiModel {
    client: OpenAiCompatibleClient,
}

impl OpenAiModel {
    pub fn new(http: reqwest::Client, settings: &ProviderSettings, model: &str, temperature: Option<f32>) -> Result<Self> {
        let client = OpenAiCompatibleClient::new(http, "openai", &settings.openai_base_url, settings.openai_api_key.as_deref(), model, temperature)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn provider(&self) -> Provider { Provider::OpenAi }
    fn model(&self) -> &str { self.client.model() }
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> { self.client.complete(messages).await }
}

/// Source of language models, keyed by provider and model name.
pub trait ModelFactory: Send + Sync {
    fn model(&self, provider: Provider, model: &str, temperature: Option<f32>) -> Result<Arc<dyn LanguageModel>>;
}

/// Builds hosted-provider clients sharing one HTTP connection pool.
pub struct ProviderRegistry {
    settings: ProviderSettings,
    http: reqwest::Client,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let http = http_client(Duration::from_secs(settings.request_timeout_secs))?;
        Ok(Self { settings, http })
    }

    pub fn http(&self) -> &reqwest::Client { &self.http }
}

impl ModelFactory for ProviderRegistry {
    fn model(&self, provider: Provider, model: &str, temperature: Option<f32>) -> Result<Arc<dyn LanguageModel>> {
        Ok(match provider {
            Provider::Groq => Arc::new(GroqModel::new(self.http.clone(), &self.settings, model, temperature)?),
            Provider::OpenAi => Arc::new(OpenAiModel::new(self.http.clone(), &self.settings, model, temperature)?),
        })
    }
}
