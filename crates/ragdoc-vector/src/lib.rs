//! In-memory cosine similarity index for one prepared document.
pub mod distance;
pub mod index;

pub use index::{Neighbor, SimilarityIndex};
