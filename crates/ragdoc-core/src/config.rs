//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` nests, e.g. `APP_SERVER__PORT`) + the raw provider
//! keys `GROQ_API_KEY`, `OPENAI_API_KEY` and `TAVILY_API_KEY`.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const PROVIDER_KEYS: [&str; 3] = ["GROQ_API_KEY", "OPENAI_API_KEY", "TAVILY_API_KEY"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub server: ServerSettings,
    pub providers: ProviderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub chunk_words: usize,
    pub top_k: usize,
    pub answer_provider: String,
    pub answer_model: String,
    pub answer_temperature: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_words: 500,
            top_k: 3,
            answer_provider: "groq".to_string(),
            answer_model: "llama3-70b-8192".to_string(),
            answer_temperature: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { model_dir: None, max_len: 256, batch_size: 32, use_fake: false, fake_dim: 384 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub allowed_models: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            upload_dir: "./data/uploads".to_string(),
            allowed_models: vec!["llama-3.3-70b-versatile".to_string(), "gpt-4o-mini".to_string()],
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub groq_base_url: String,
    pub openai_base_url: String,
    pub tavily_url: String,
    pub request_timeout_secs: u64,
    pub search_results: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            openai_api_key: None,
            tavily_api_key: None,
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            tavily_url: "https://api.tavily.com/search".to_string(),
            request_timeout_secs: 60,
            search_results: 2,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.rag.chunk_words == 0 { return Err(Error::InvalidConfig("rag.chunk_words must be at least 1".into())); }
        if self.rag.top_k == 0 { return Err(Error::InvalidConfig("rag.top_k must be at least 1".into())); }
        if self.embedding.max_len == 0 || self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.max_len and embedding.batch_size must be positive".into()));
        }
        if self.server.port == 0 { return Err(Error::InvalidConfig("server.port must be non-zero".into())); }
        Ok(())
    }

    /// Anchor relative `server.upload_dir` and `embedding.model_dir` at `base`,
    /// the directory the configuration files were read from.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.server.upload_dir = resolve_with_base(base, &self.server.upload_dir).display().to_string();
        if let Some(dir) = self.embedding.model_dir.take() {
            self.embedding.model_dir = Some(resolve_with_base(base, dir).display().to_string());
        }
    }
}

pub struct Config {
    figment: Figment,
    settings: Settings,
}

impl Config {
    /// Load from the current directory for the environment named by `RUST_ENV` (default `dev`).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(&env::current_dir()?, &env_name)
    }

    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&PROVIDER_KEYS).map(|k| format!("providers.{}", k.as_str().to_ascii_lowercase()).into()));
        let mut config = Self::from_figment(figment)?;
        config.settings.resolve_paths(dir);
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(Self { figment, settings })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }
}

/// Expand `~` and `$VAR`/`${VAR}` in a configured path. Unknown variables are left as written.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// `p` after expansion, joined onto `base` unless it is already absolute.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
