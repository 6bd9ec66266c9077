//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: the engine decides what is spoken, these
//! helpers decide how it looks in a terminal.

pub mod highlight;
pub mod tables;

pub use highlight::TerminalHighlight;
pub use tables::{print_separator, truncate_string};
