//! Terminal rendition of the sentence highlight.

use std::sync::{Mutex, PoisonError};

use console::style;
use lector_voice::HighlightSink;
use lector_voice::position::char_slice;

/// Prints the marked sentence as it is spoken.
///
/// In JSON mode nothing is printed; the `sentenceStarted` event carries the
/// same range.
pub struct TerminalHighlight {
    text: String,
    json: bool,
    current: Mutex<Option<(usize, usize)>>,
}

impl TerminalHighlight {
    pub fn new(text: impl Into<String>, json: bool) -> Self {
        Self {
            text: text.into(),
            json,
            current: Mutex::new(None),
        }
    }

    /// The range currently marked, if any.
    pub fn current(&self) -> Option<(usize, usize)> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The marked text, whitespace-trimmed.
    pub fn marked_text(&self) -> Option<&str> {
        self.current()
            .map(|(start, end)| char_slice(&self.text, start, end).trim())
    }
}

impl HighlightSink for TerminalHighlight {
    fn mark(&self, start: usize, end: usize) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some((start, end));
        if self.json {
            return;
        }
        let sentence = char_slice(&self.text, start, end).trim();
        println!(
            "{} {}",
            style(format!("[{start}..{end}]")).dim(),
            style(sentence).cyan().bold()
        );
    }

    fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let highlight = TerminalHighlight::new("Hej. Hvordan går det?", true);
        assert_eq!(highlight.current(), None);

        highlight.mark(5, 21);
        assert_eq!(highlight.current(), Some((5, 21)));
        assert_eq!(highlight.marked_text(), Some("Hvordan går det?"));

        highlight.clear();
        assert_eq!(highlight.current(), None);
        assert_eq!(highlight.marked_text(), None);
    }

    #[test]
    fn test_mark_replaces_previous() {
        let highlight = TerminalHighlight::new("One. Two.", true);
        highlight.mark(0, 5);
        highlight.mark(5, 9);
        assert_eq!(highlight.marked_text(), Some("Two."));
    }
}
