//! Sentence segmentation.
//!
//! Splits raw text at sentence boundaries: a `.`, `!` or `?` followed by a
//! run of whitespace. The punctuation stays with the sentence it ends, the
//! whitespace run is consumed by the split. Pieces are never merged or
//! reordered; empty and whitespace-only pieces are dropped.

use std::sync::LazyLock;

use regex::Regex;

/// Punctuation plus the whitespace run that follows it.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Split `text` into sentences.
///
/// The returned strings are exactly the pieces between boundaries (not
/// trimmed); callers that need the trimmed form trim themselves. Text with
/// no boundary yields at most one sentence.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut cursor = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Keep the punctuation (always one ASCII byte) with its sentence.
        let end = boundary.start() + 1;
        push_piece(&mut sentences, &text[cursor..end]);
        cursor = boundary.end();
    }
    push_piece(&mut sentences, &text[cursor..]);

    sentences
}

fn push_piece(sentences: &mut Vec<String>, piece: &str) {
    if !piece.trim().is_empty() {
        sentences.push(piece.to_string());
    }
}
