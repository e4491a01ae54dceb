use ragdoc_text::{chunk_text, Chunker, DEFAULT_MAX_WORDS};
use ragdoc_core::Error;

fn words(text: &str) -> usize { text.split_whitespace().count() }

#[test]
fn three_words_make_one_chunk() {
    let chunks = chunk_text("cat dog bird", 500).expect("chunk");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "cat dog bird");
    assert_eq!(chunks[0].index, 0);
}

#[test]
fn thousand_words_split_evenly() {
    let text: Vec<String> = (0..1000).map(|i| format!("w{}", i)).collect();
    let chunks = chunk_text(&text.join(" "), 500).expect("chunk");
    assert_eq!(chunks.len(), 2);
    assert_eq!(words(&chunks[0].text), 500);
    assert_eq!(words(&chunks[1].text), 500);
    assert!(chunks[1].text.starts_with("w500 "));
    assert_eq!(chunks[1].index, 1);
}

#[test]
fn remainder_becomes_final_chunk() {
    let chunks = chunk_text("a b c d e f g", 3).expect("chunk");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["a b c", "d e f", "g"]);
}

#[test]
fn chunks_cover_every_word_in_order() {
    let text = "  The quick\tbrown fox\n\njumps over   the lazy dog.\r\nAnd then   sleeps ";
    let original: Vec<&str> = text.split_whitespace().collect();
    for max_words in 1..=original.len() + 1 {
        let chunks = Chunker::new(max_words).expect("chunker").chunk(text);
        let rejoined: Vec<String> = chunks.iter().flat_map(|c| c.text.split(' ').map(str::to_string)).collect();
        assert_eq!(rejoined, original, "max_words={max_words}");
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty() && words(&c.text) <= max_words));
    }
}

#[test]
fn whitespace_only_text_yields_no_chunks() {
    assert!(chunk_text(" \n\t  \r\n", 500).expect("chunk").is_empty());
    assert!(chunk_text("", 500).expect("chunk").is_empty());
}

#[test]
fn zero_max_words_is_invalid_input() {
    let err = chunk_text("anything", 0).err().expect("must fail");
    assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
}

#[test]
fn default_chunker_uses_five_hundred_words() {
    assert_eq!(DEFAULT_MAX_WORDS, 500);
    let text: Vec<String> = (0..501).map(|i| format!("w{}", i)).collect();
    let chunks = Chunker::default().chunk(&text.join(" "));
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].text, "w500");
}
