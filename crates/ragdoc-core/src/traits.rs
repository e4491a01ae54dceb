use crate::error::Result;

/// Text encoder producing one fixed-length vector per input string.
///
/// Implementations are loaded once and shared read-only, so `embed_batch`
/// takes `&self` and must be deterministic for a fixed model.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model (e.g. `minilm:all-MiniLM-L6-v2:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One row per input, in input order. An empty batch yields an empty matrix.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
