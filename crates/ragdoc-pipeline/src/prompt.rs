use ragdoc_core::types::ScoredPassage;

/// Join passages, most relevant first, separated by a blank line.
pub fn context_block(passages: &[ScoredPassage]) -> String {
    passages.iter().map(|p| p.passage.text.as_str()).collect::<Vec<_>>().join("\n\n")
}

/// The answer model is instructed to abstain when the context lacks the answer.
pub fn grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the following question using the context. If the answer is not in the context, say 'I don't know':\n\nContext:\n{}\n\nQuestion: {}",
        context, question
    )
}
