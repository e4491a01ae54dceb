use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to extract text from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("No text could be extracted from {}", .0.display())]
    EmptyDocument(PathBuf),

    #[error("Chunking {} produced no passages", .0.display())]
    NoChunks(PathBuf),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Similarity index has not been fitted")]
    NotFitted,

    #[error("No document has been prepared; upload a document first")]
    NotPrepared,

    #[error("{provider} request failed: {reason}")]
    Provider { provider: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Extraction { path: path.into(), reason: reason.to_string() }
    }

    pub fn embedding(reason: impl ToString) -> Self { Self::Embedding(reason.to_string()) }

    pub fn provider(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Provider { provider: provider.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
