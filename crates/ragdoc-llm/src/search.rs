use async_trait::async_trait;
use ragdoc_core::config::ProviderSettings;
use ragdoc_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Render results as a system message the chat model can cite from.
pub fn search_context(results: &[SearchResult]) -> Option<String> {
    if results.is_empty() { return None; }
    let mut out = String::from("Web search results:\n");
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n[{}] {} ({})\n{}\n", i + 1, r.title, r.url, r.content.trim()));
    }
    Some(out)
}

pub struct TavilySearch {
    http: reqwest::Client,
    url: String,
    api_key: String,
    max_results: usize,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl TavilySearch {
    /// `None` when no Tavily key is configured; web search is then skipped.
    pub fn from_settings(http: reqwest::Client, settings: &ProviderSettings) -> Option<Self> {
        let api_key = settings.tavily_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self { http, url: settings.tavily_url.clone(), api_key: api_key.to_string(), max_results: settings.search_results.max(1) })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let body = TavilyRequest { api_key: &self.api_key, query, max_results: self.max_results };
        let response = self.http.post(&self.url).json(&body).send().await.map_err(|e| Error::provider("tavily", e))?;
        let status = response.status();
        if !status.is_success() { return Err(Error::provider("tavily", format!("HTTP {}", status))); }
        let parsed: TavilyResponse = response.json().await.map_err(|e| Error::provider("tavily", e))?;
        Ok(parsed.results.into_iter().take(self.max_results).collect())
    }
}
