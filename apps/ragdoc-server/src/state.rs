use std::path::PathBuf;
use std::sync::Arc;

use ragdoc_core::config::{expand_path, Settings};
use ragdoc_core::Result;
use ragdoc_embed::shared_embedder;
use ragdoc_llm::{ModelFactory, ProviderRegistry, TavilySearch, WebSearch};
use ragdoc_pipeline::RetrievalPipeline;
use tokio::sync::OnceCell;

pub type PipelineLoader = Arc<dyn Fn() -> Result<RetrievalPipeline> + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: Settings,
    upload_dir: PathBuf,
    /// Built lazily because loading the embedding model is slow and may fail.
    pipeline: OnceCell<Arc<RetrievalPipeline>>,
    loader: PipelineLoader,
    models: Arc<dyn ModelFactory>,
    web_search: Option<Arc<dyn WebSearch>>,
}

impl AppState {
    pub fn new(settings: Settings, loader: PipelineLoader, models: Arc<dyn ModelFactory>, web_search: Option<Arc<dyn WebSearch>>) -> Self {
        let upload_dir = expand_path(&settings.server.upload_dir);
        Self { inner: Arc::new(AppStateInner { settings, upload_dir, pipeline: OnceCell::new(), loader, models, web_search }) }
    }

    /// Production wiring: shared embedding model, hosted providers, Tavily when a key is set.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let registry = ProviderRegistry::new(settings.providers.clone())?;
        let web_search = TavilySearch::from_settings(registry.http().clone(), &settings.providers).map(|s| Arc::new(s) as Arc<dyn WebSearch>);
        let embedding = settings.embedding.clone();
        let rag = settings.rag.clone();
        let loader: PipelineLoader = Arc::new(move || RetrievalPipeline::from_settings(shared_embedder(&embedding)?, &rag));
        Ok(Self::new(settings, loader, Arc::new(registry), web_search))
    }

    pub fn settings(&self) -> &Settings { &self.inner.settings }
    pub fn upload_dir(&self) -> &PathBuf { &self.inner.upload_dir }
    pub fn models(&self) -> &dyn ModelFactory { self.inner.models.as_ref() }
    pub fn web_search(&self) -> Option<&Arc<dyn WebSearch>> { self.inner.web_search.as_ref() }

    /// The pipeline, initializing it on the blocking pool if no earlier attempt succeeded.
    pub async fn pipeline(&self) -> crate::error::ApiResult<Arc<RetrievalPipeline>> {
        self.inner
            .pipeline
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.inner.loader);
                let pipeline = tokio::task::spawn_blocking(move || loader()).await??;
                Ok::<_, crate::error::ApiError>(Arc::new(pipeline))
            })
            .await
            .cloned()
    }

    /// The pipeline if it has already been initialized.
    pub fn current_pipeline(&self) -> Option<Arc<RetrievalPipeline>> { self.inner.pipeline.get().cloned() }
}
