//! Highlight sink boundary.
//!
//! Offsets are character positions in the text handed to
//! [`PlaybackController::speak`](crate::controller::PlaybackController::speak).

/// Visually marks the sentence currently being spoken.
pub trait HighlightSink: Send + Sync {
    /// Mark `[start, end)`, replacing any previous mark.
    fn mark(&self, start: usize, end: usize);

    /// Remove the current mark, if any.
    fn clear(&self);
}
