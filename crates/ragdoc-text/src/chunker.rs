use ragdoc_core::types::Passage;
use ragdoc_core::{Error, Result};

pub const DEFAULT_MAX_WORDS: usize = 500;

#[derive(Debug, Clone)]
pub struct Chunker {
    max_words: usize,
}

impl Default for Chunker {
    fn default() -> Self { Self { max_words: DEFAULT_MAX_WORDS } }
}

impl Chunker {
    pub fn new(max_words: usize) -> Result<Self> {
        if max_words == 0 { return Err(Error::InvalidInput("max_words must be at least 1".into())); }
        Ok(Self { max_words })
    }

    /// Group whitespace-separated words into passages of at most `max_words`.
    ///
    /// Text without any words yields an empty vector; every returned passage
    /// holds at least one word.
    pub fn chunk(&self, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut buffer: Vec<&str> = Vec::with_capacity(self.max_words);
        for word in text.split_whitespace() {
            buffer.push(word);
            if buffer.len() >= self.max_words {
                passages.push(Passage { index: passages.len(), text: buffer.join(" ") });
                buffer.clear();
            }
        }
        if !buffer.is_empty() {
            passages.push(Passage { index: passages.len(), text: buffer.join(" ") });
        }
        passages
    }
}

pub fn chunk_text(text: &str, max_words: usize) -> Result<Vec<Passage>> {
    Ok(Chunker::new(max_words)?.chunk(text))
}
