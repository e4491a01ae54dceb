//! Domain types shared by the extractor, index and pipeline crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One contiguous run of document words, the unit of retrieval.
///
/// - `index`: position in the passage sequence of the source document
/// - `text`: the words of the passage joined by single spaces, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub index: usize,
    pub text: String,
}

/// A passage returned by retrieval together with its cosine distance to the query.
///
/// `distance` is `1 - cosine similarity`; lower is more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub distance: f32,
}

/// Summary of a successful `prepare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedDocument {
    pub source: PathBuf,
    pub passages: usize,
    pub dimension: usize,
}
