//! ragdoc-text
//!
//! Turns a source document into retrieval passages: `extract` reads PDF or
//! plain-text files into one string, `chunker` splits that string into
//! bounded word windows.
pub mod chunker;
pub mod extract;

pub use chunker::{chunk_text, Chunker, DEFAULT_MAX_WORDS};
pub use extract::{extract_text, DocumentKind};
