//! Position mapping: locates each segmented sentence in the source text.
//!
//! Offsets are **character** positions (not bytes) so that they line up
//! with what a text widget or terminal highlighter counts.
//!
//! The search is sequential and forward-only: sentence *i* is searched for
//! starting right after sentence *i-1*'s end, case-insensitively, using the
//! trimmed sentence text. The recorded range is `hit .. hit + len(sentence)`
//! where the length is the sentence **as split**, so any whitespace the
//! segmenter left on the sentence is part of the highlight. Sentences that
//! cannot be found are skipped and reported in [`PositionMap::skipped`].

use serde::Serialize;

/// A sentence paired with its character range in the source text.
///
/// Invariant: `start_offset <= end_offset <= source.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceUnit {
    /// Sentence text as produced by the segmenter.
    pub text: String,

    /// First character of the sentence in the source text.
    pub start_offset: usize,

    /// One past the last highlighted character.
    pub end_offset: usize,
}

impl SentenceUnit {
    /// Number of highlighted characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Whether the highlighted range is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

/// A sentence that could not be located and will not be spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSentence {
    /// Index in the segmented sequence.
    pub index: usize,

    /// The sentence text.
    pub text: String,
}

/// Result of mapping a sentence sequence onto its source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    /// Located sentences, in source order.
    pub units: Vec<SentenceUnit>,

    /// Sentences dropped because they were not found after the anchor.
    pub skipped: Vec<SkippedSentence>,
}

/// Locate `sentences` in `source`, starting the search at offset 0.
#[must_use]
pub fn map_positions<S: AsRef<str>>(source: &str, sentences: &[S]) -> PositionMap {
    map_positions_from(source, sentences, 0)
}

/// Locate `sentences` in `source`, starting the search at character
/// `from_offset` (clamped to the end of the text).
#[must_use]
pub fn map_positions_from<S: AsRef<str>>(
    source: &str,
    sentences: &[S],
    from_offset: usize,
) -> PositionMap {
    let haystack: Vec<char> = source.chars().map(fold_case).collect();
    let mut anchor = from_offset.min(haystack.len());
    let mut map = PositionMap::default();

    for (index, sentence) in sentences.iter().enumerate() {
        let sentence = sentence.as_ref();
        let needle: Vec<char> = sentence.trim().chars().map(fold_case).collect();

        let Some(hit) = find_from(&haystack, &needle, anchor) else {
            tracing::warn!(
                index,
                anchor,
                sentence = &sentence[..floor_char_boundary(sentence, 80)],
                "Sentence not found in source text, skipping"
            );
            map.skipped.push(SkippedSentence {
                index,
                text: sentence.to_string(),
            });
            continue;
        };

        let end = (hit + sentence.chars().count()).min(haystack.len());
        map.units.push(SentenceUnit {
            text: sentence.to_string(),
            start_offset: hit,
            end_offset: end,
        });
        anchor = end;
    }

    map
}

/// Slice `text` by character offsets. Out-of-range offsets are clamped.
#[must_use]
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end.max(start));
    &text[start_byte..end_byte]
}

/// Convert a character offset into a byte offset (clamped to the text end).
#[must_use]
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(byte, _)| byte)
}

// ── Internal helpers ───────────────────────────────────────────────

/// Single-character case fold. Multi-char lowercase expansions keep only
/// their first char so that offsets in the folded text match the source.
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn floor_char_boundary(text: &str, max: usize) -> usize {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}
