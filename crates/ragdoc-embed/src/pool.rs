use candle_core::{DType, Tensor};
use ragdoc_core::{Error, Result};

use crate::embed_err;

/// Mean-pool `[B,T,H]` hidden states over unmasked tokens, then L2-normalize each row.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    if dims.len() != 3 {
        return Err(Error::embedding(format!("hidden shape must be [B,T,H], got {:?}", dims)));
    }
    let (batch, hidden_dim) = (dims[0], dims[2]);

    let mask = attention_mask.to_device(hidden.device()).and_then(|m| m.to_dtype(hidden.dtype())).map_err(embed_err)?;
    let mask_b = mask.unsqueeze(2).and_then(|m| m.broadcast_as(hidden.shape())).map_err(embed_err)?;
    let sum = (hidden * &mask_b).and_then(|m| m.sum(1)).map_err(embed_err)?;
    let lengths = mask.sum(1).and_then(|l| l.unsqueeze(1)).and_then(|l| l.to_dtype(sum.dtype())).map_err(embed_err)?;
    let mean = sum.broadcast_div(&lengths).map_err(embed_err)?;

    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device()).and_then(|e| e.to_dtype(hidden.dtype())).and_then(|e| e.unsqueeze(0)).map_err(embed_err)?;
    let norm = mean.sqr().and_then(|s| s.sum_keepdim(1)).and_then(|s| s.sqrt()).and_then(|n| n.broadcast_add(&eps)).map_err(embed_err)?;
    let pooled = mean.broadcast_div(&norm).map_err(embed_err)?;
    if pooled.dims() != [batch, hidden_dim] {
        return Err(Error::embedding(format!("pooled shape {:?} != [{}, {}]", pooled.dims(), batch, hidden_dim)));
    }
    Ok(pooled)
}
