use std::collections::HashMap;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use ragdoc_core::config::{expand_path, EmbeddingSettings};
use ragdoc_core::traits::Embedder;
use ragdoc_core::{Error, Result};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

pub(crate) fn embed_err(e: impl Display) -> Error { Error::embedding(e) }

/// Sentence encoder over a BERT checkpoint (all-MiniLM-L6-v2 by default) with
/// masked mean pooling, matching the sentence-transformers recipe.
pub struct MiniLmEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, id: String, dim: usize, max_len: usize, batch_size: usize, pad_id: u32 }

impl MiniLmEmbedder {
    /// Load `tokenizer.json`, `config.json` and `model.safetensors` (or `pytorch_model.bin`) from `model_dir`.
    pub fn load(model_dir: &Path, settings: &EmbeddingSettings) -> Result<Self> {
        let device = select_device();
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)))?;
        let config_path = model_dir.join("config.json");
        let config_text = std::fs::read_to_string(&config_path)
            .map_err(|e| Error::embedding(format!("Failed to read {}: {}", config_path.display(), e)))?;
        let config: BertConfig = serde_json::from_str(&config_text).map_err(embed_err)?;
        let dim = serde_json::from_str::<serde_json::Value>(&config_text)
            .map_err(embed_err)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| Error::embedding(format!("{} has no hidden_size", config_path.display())))? as usize;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config).map_err(embed_err)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        let name = model_dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self { model, tokenizer, device, id: format!("minilm:{}:d{}", name, dim), dim, max_len: settings.max_len, batch_size: settings.batch_size, pad_id })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(embed_err)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask)).map_err(embed_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec2())
            .map_err(embed_err)?;
        if rows.len() != texts.len() || rows.iter().any(|r| r.len() != self.dim) {
            return Err(Error::embedding(format!("model returned {} rows for {} inputs", rows.len(), texts.len())));
        }
        Ok(rows)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        return unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device) }.map_err(embed_err);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)
        .map_err(|e| Error::embedding(format!("Failed to read weights from {}: {}", weights_path.display(), e)))?;
    let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

impl Embedder for MiniLmEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size.max(1)) { out.extend(self.embed_chunk(chunk)?); }
        Ok(out)
    }
}

/// Deterministic bag-of-words hashing encoder for tests and offline development.
///
/// Each whitespace token lands in an `XxHash64` bucket; the result is
/// L2-normalized. Texts without tokens map to the zero vector.
pub struct HashEmbedder { dim: usize, id: String }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1), id: format!("hash:xxh64:d{}", dim.max(1)) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_one(t)).collect()) }
}

fn fake_requested(settings: &EmbeddingSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the configured encoder: the hashing encoder when fake embeddings are
/// requested (`embedding.use_fake` or `APP_USE_FAKE_EMBEDDINGS=1`), else the BERT model.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if fake_requested(settings) { return Ok(Box::new(HashEmbedder::new(settings.fake_dim))); }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Box::new(MiniLmEmbedder::load(&model_dir, settings)?))
}

static SHARED: OnceLock<Arc<dyn Embedder>> = OnceLock::new();
static LOADING: Mutex<()> = Mutex::new(());

/// Process-wide encoder, loaded on first use and shared read-only afterwards.
///
/// Settings passed after the first successful load are ignored.
pub fn shared_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if let Some(e) = SHARED.get() { return Ok(Arc::clone(e)); }
    let _guard = LOADING.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(e) = SHARED.get() { return Ok(Arc::clone(e)); }
    let loaded: Arc<dyn Embedder> = Arc::from(get_default_embedder(settings)?);
    Ok(Arc::clone(SHARED.get_or_init(|| loaded)))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = &settings.model_dir { candidates.push(expand_path(dir)); }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) { candidates.push(expand_path(dir)); }
    }
    candidates.push(Path::new("../models").join(DEFAULT_MODEL));
    candidates.push(Path::new("models").join(DEFAULT_MODEL));
    let checked = candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ");
    candidates
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| Error::embedding(format!("Could not locate the {} model directory. Checked {}", DEFAULT_MODEL, checked)))
}
