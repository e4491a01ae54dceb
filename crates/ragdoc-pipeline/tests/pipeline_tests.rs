use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ragdoc_core::traits::Embedder;
use ragdoc_core::{Error, Result};
use ragdoc_embed::HashEmbedder;
use ragdoc_pipeline::{PipelineStatus, RetrievalPipeline, DEFAULT_TOP_K};
use tempfile::TempDir;

const VOCAB: [&str; 6] = ["rust", "python", "garden", "tomato", "engine", "piston"];

/// Counts vocabulary words; anything else contributes nothing.
struct KeywordEmbedder {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new() -> Arc<Self> { Arc::new(Self { fail: AtomicBool::new(false), calls: AtomicUsize::new(0) }) }
}

impl Embedder for KeywordEmbedder {
    fn id(&self) -> &str { "keyword" }
    fn dim(&self) -> usize { VOCAB.len() }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) { return Err(Error::embedding("out of memory")); }
        Ok(texts
            .iter()
            .map(|t| VOCAB.iter().map(|w| t.split_whitespace().filter(|x| x == w).count() as f32).collect())
            .collect())
    }
}

/// Returns a fixed number of rows regardless of input.
struct ShortEmbedder(usize);

impl Embedder for ShortEmbedder {
    fn id(&self) -> &str { "short" }
    fn dim(&self) -> usize { 2 }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(vec![vec![1.0, 0.0]; self.0]) }
}

fn write_doc(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

const MIXED: &str = "rust rust python code\ngarden tomato soil water\n\nengine piston oil fuel";

#[test]
fn retrieve_before_prepare_is_not_prepared() {
    let pipeline = RetrievalPipeline::new(KeywordEmbedder::new());
    assert!(matches!(pipeline.retrieve("anything", 3), Err(Error::NotPrepared)));
    assert!(matches!(pipeline.build_grounded_prompt("anything", 3), Err(Error::NotPrepared)));
    assert_eq!(pipeline.status(), PipelineStatus::Empty);
}

#[test]
fn prepare_then_retrieve_most_relevant_first() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "mixed.txt", MIXED);
    let pipeline = RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 4).expect("pipeline");

    let summary = pipeline.prepare(&path).expect("prepare");
    assert_eq!(summary.passages, 3);
    assert_eq!(summary.dimension, VOCAB.len());
    assert_eq!(summary.source, path);
    assert!(pipeline.is_ready());

    let hits = pipeline.retrieve("which tomato grows in the garden", 1).expect("retrieve");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].passage.text, "garden tomato soil water");
    assert_eq!(hits[0].passage.index, 1);

    let hits = pipeline.retrieve("piston", DEFAULT_TOP_K).expect("retrieve");
    assert_eq!(hits[0].passage.text, "engine piston oil fuel");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn top_k_is_clamped_to_passage_count() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "two.txt", "rust python garden tomato");
    let pipeline = RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 2).expect("pipeline");
    pipeline.prepare(&path).expect("prepare");
    let hits = pipeline.retrieve("garden", 5).expect("retrieve");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].passage.text, "garden tomato");
    assert_eq!(hits[1].passage.text, "rust python");
}

#[test]
fn zero_top_k_is_invalid_input() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "doc.txt", MIXED);
    let pipeline = RetrievalPipeline::new(KeywordEmbedder::new());
    pipeline.prepare(&path).expect("prepare");
    assert!(matches!(pipeline.retrieve("rust", 0), Err(Error::InvalidInput(_))));
}

#[test]
fn grounded_prompt_matches_template() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "mixed.txt", MIXED);
    let pipeline = RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 4).expect("pipeline");
    pipeline.prepare(&path).expect("prepare");

    let prompt = pipeline.build_grounded_prompt("tomato garden?", 2).expect("prompt");
    let hits = pipeline.retrieve("tomato garden?", 2).expect("retrieve");
    let expected = format!(
        "Answer the following question using the context. If the answer is not in the context, say 'I don't know':\n\nContext:\n{}\n\n{}\n\nQuestion: tomato garden?",
        hits[0].passage.text, hits[1].passage.text
    );
    assert_eq!(prompt, expected);
    assert!(prompt.contains("Context:\ngarden tomato soil water\n\n"));
}

#[test]
fn whitespace_document_is_empty_and_keeps_previous_state() {
    let tmp = TempDir::new().unwrap();
    let good = write_doc(&tmp, "good.txt", MIXED);
    let blank = write_doc(&tmp, "blank.txt", "  \n\t \r\n ");
    let pipeline = RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 4).expect("pipeline");

    assert!(matches!(pipeline.prepare(&blank), Err(Error::EmptyDocument(p)) if p == blank));
    assert_eq!(pipeline.status(), PipelineStatus::Empty);

    pipeline.prepare(&good).expect("prepare");
    assert!(matches!(pipeline.prepare(&blank), Err(Error::EmptyDocument(_))));
    match pipeline.status() {
        PipelineStatus::Ready(doc) => assert_eq!(doc.source, good),
        PipelineStatus::Empty => panic!("previous document was discarded"),
    }
    assert_eq!(pipeline.retrieve("piston", 1).expect("retrieve")[0].passage.text, "engine piston oil fuel");
}

#[test]
fn embedding_failure_keeps_previous_document() {
    let tmp = TempDir::new().unwrap();
    let first = write_doc(&tmp, "first.txt", MIXED);
    let second = write_doc(&tmp, "second.txt", "python python python python");
    let embedder = KeywordEmbedder::new();
    let pipeline = RetrievalPipeline::with_chunk_words(embedder.clone(), 4).expect("pipeline");
    pipeline.prepare(&first).expect("prepare");

    embedder.fail.store(true, Ordering::SeqCst);
    let err = pipeline.prepare(&second).err().expect("must fail");
    assert!(matches!(err, Error::Embedding(ref m) if m.contains("out of memory")), "got {err:?}");

    embedder.fail.store(false, Ordering::SeqCst);
    let hits = pipeline.retrieve("garden", 1).expect("old index still served");
    assert_eq!(hits[0].passage.text, "garden tomato soil water");
}

#[test]
fn embedding_failure_without_previous_document_stays_not_prepared() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "doc.txt", MIXED);
    let embedder = KeywordEmbedder::new();
    embedder.fail.store(true, Ordering::SeqCst);
    let pipeline = RetrievalPipeline::new(embedder.clone());
    assert!(matches!(pipeline.prepare(&path), Err(Error::Embedding(_))));
    embedder.fail.store(false, Ordering::SeqCst);
    assert!(matches!(pipeline.retrieve("rust", 1), Err(Error::NotPrepared)));
}

#[test]
fn row_count_mismatch_is_an_embedding_error() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "doc.txt", MIXED);
    for rows in [0, 1] {
        let pipeline = RetrievalPipeline::with_chunk_words(Arc::new(ShortEmbedder(rows)), 4).expect("pipeline");
        assert!(matches!(pipeline.prepare(&path), Err(Error::Embedding(_))), "rows={rows}");
        assert!(!pipeline.is_ready());
    }
}

#[test]
fn extraction_failure_is_reported_with_path() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.pdf");
    let pipeline = RetrievalPipeline::new(KeywordEmbedder::new());
    assert!(matches!(pipeline.prepare(&missing), Err(Error::Extraction { path, .. }) if path == missing));
}

#[test]
fn new_prepare_replaces_old_document() {
    let tmp = TempDir::new().unwrap();
    let first = write_doc(&tmp, "first.txt", MIXED);
    let second = write_doc(&tmp, "second.md", "python python rust");
    let pipeline = RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 4).expect("pipeline");
    pipeline.prepare(&first).expect("prepare first");
    let summary = pipeline.prepare(&second).expect("prepare second");
    assert_eq!(summary.passages, 1);
    let hits = pipeline.retrieve("garden", 3).expect("retrieve");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].passage.text, "python python rust");
}

#[test]
fn zero_chunk_words_is_rejected() {
    assert!(matches!(RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 0), Err(Error::InvalidInput(_))));
}

#[test]
fn hash_embedder_pipeline_finds_exact_passage() {
    let tmp = TempDir::new().unwrap();
    let body: Vec<String> = (0..40).map(|i| format!("token{} filler{}", i, i % 3)).collect();
    let path = write_doc(&tmp, "hash.txt", &body.join(" "));
    let pipeline = RetrievalPipeline::with_chunk_words(Arc::new(HashEmbedder::new(256)), 10).expect("pipeline");
    assert_eq!(pipeline.prepare(&path).expect("prepare").passages, 8);
    let hits = pipeline.retrieve("token10 filler1 token11 filler2 token12 filler0 token13 filler1 token14 filler2", 1).expect("retrieve");
    assert_eq!(hits[0].passage.index, 2);
    assert!(hits[0].distance < 1e-4);
}

#[test]
fn concurrent_queries_share_the_index() {
    let tmp = TempDir::new().unwrap();
    let path = write_doc(&tmp, "doc.txt", MIXED);
    let pipeline = Arc::new(RetrievalPipeline::with_chunk_words(KeywordEmbedder::new(), 4).expect("pipeline"));
    pipeline.prepare(&path).expect("prepare");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let p = Arc::clone(&pipeline);
            std::thread::spawn(move || p.retrieve("engine", 1).map(|h| h[0].passage.index))
        })
        .collect();
    for h in handles { assert_eq!(h.join().expect("thread").expect("retrieve"), 2); }
}
