use candle_core::{Device, Tensor};
use ragdoc_core::{Error, Result};
use tokenizers::Tokenizer;

use crate::embed_err;

/// Encode a batch into `(input_ids, attention_mask)`, both `[B, T]` with `T`
/// the longest encoding in the batch, capped at `max_len`.
///
/// Truncated encodings keep their final special token.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > max_len {
            let last = ids[ids.len() - 1];
            ids.truncate(max_len);
            mask.truncate(max_len);
            ids[max_len - 1] = last;
        }
        rows.push((ids, mask));
    }
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (ids, mask) in &rows {
        let pad = width - ids.len();
        flat_ids.extend_from_slice(ids);
        flat_ids.extend(std::iter::repeat(pad_id).take(pad));
        flat_mask.extend_from_slice(mask);
        flat_mask.extend(std::iter::repeat(0u32).take(pad));
    }
    let input_ids = Tensor::from_vec(flat_ids, (rows.len(), width), device).map_err(embed_err)?;
    let attention_mask = Tensor::from_vec(flat_mask, (rows.len(), width), device).map_err(embed_err)?;
    Ok((input_ids, attention_mask))
}
