//! Retrieval pipeline: extract → chunk → embed → index a document, then
//! answer questions with the most similar passages.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use ragdoc_core::config::RagSettings;
use ragdoc_core::traits::Embedder;
use ragdoc_core::types::{Passage, PreparedDocument, ScoredPassage};
use ragdoc_core::{Error, Result};
use ragdoc_text::{extract_text, Chunker};
use ragdoc_vector::SimilarityIndex;

pub mod prompt;

pub use prompt::{context_block, grounded_prompt};

pub const DEFAULT_TOP_K: usize = 3;

struct IndexedDocument {
    source: PathBuf,
    passages: Vec<Passage>,
    index: SimilarityIndex,
}

impl IndexedDocument {
    fn summary(&self) -> PreparedDocument {
        PreparedDocument { source: self.source.clone(), passages: self.passages.len(), dimension: self.index.dim() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Empty,
    Ready(PreparedDocument),
}

/// Owns the index of the most recently prepared document.
///
/// `prepare` holds the lock exclusively for its whole run and installs the
/// new index only after every stage succeeded, so a failed prepare leaves the
/// previous document searchable. Queries share the lock.
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    state: RwLock<Option<IndexedDocument>>,
}

impl RetrievalPipeline {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, chunker: Chunker::default(), state: RwLock::new(None) }
    }

    pub fn with_chunk_words(embedder: Arc<dyn Embedder>, chunk_words: usize) -> Result<Self> {
        Ok(Self { embedder, chunker: Chunker::new(chunk_words)?, state: RwLock::new(None) })
    }

    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &RagSettings) -> Result<Self> {
        Self::with_chunk_words(embedder, settings.chunk_words)
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    pub fn prepare(&self, path: &Path) -> Result<PreparedDocument> {
        let mut state = self.state.write();
        let document = self.index_document(path)?;
        let summary = document.summary();
        *state = Some(document);
        Ok(summary)
    }

    fn index_document(&self, path: &Path) -> Result<IndexedDocument> {
        let text = extract_text(path)?;
        if text.trim().is_empty() { return Err(Error::EmptyDocument(path.to_path_buf())); }

        let passages = self.chunker.chunk(&text);
        if passages.is_empty() { return Err(Error::NoChunks(path.to_path_buf())); }

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).map_err(as_embedding_error)?;
        if vectors.is_empty() { return Err(Error::embedding("model returned an empty matrix")); }
        if vectors.len() != passages.len() {
            return Err(Error::embedding(format!("model returned {} vectors for {} passages", vectors.len(), passages.len())));
        }
        let index = SimilarityIndex::fitted(&vectors)
            .map_err(|e| Error::embedding(format!("model returned unusable vectors: {}", e)))?;

        Ok(IndexedDocument { source: path.to_path_buf(), passages, index })
    }

    /// The `top_k` passages nearest to `question` (fewer if the document is short), most relevant first.
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<ScoredPassage>> {
        let state = self.state.read();
        let document = state.as_ref().ok_or(Error::NotPrepared)?;
        if top_k == 0 { return Err(Error::InvalidInput("top_k must be a positive integer".into())); }

        let query = self
            .embedder
            .embed_batch(&[question.to_string()])
            .map_err(as_embedding_error)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("model returned no vector for the question"))?;
        let neighbors = document.index.search(&query, top_k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| ScoredPassage { passage: document.passages[n.index].clone(), distance: n.distance })
            .collect())
    }

    pub fn build_grounded_prompt(&self, question: &str, top_k: usize) -> Result<String> {
        let passages = self.retrieve(question, top_k)?;
        Ok(grounded_prompt(&context_block(&passages), question))
    }

    pub fn status(&self) -> PipelineStatus {
        match self.state.read().as_ref() {
            Some(document) => PipelineStatus::Ready(document.summary()),
            None => PipelineStatus::Empty,
        }
    }

    pub fn is_ready(&self) -> bool { self.state.read().is_some() }
}

fn as_embedding_error(e: Error) -> Error {
    match e {
        Error::Embedding(_) => e,
        other => Error::embedding(other),
    }
}
