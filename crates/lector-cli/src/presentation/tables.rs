//! Table formatting utilities for CLI output.

/// Truncates a string to a maximum number of characters, adding "..." if
/// needed.
///
/// # Examples
///
/// ```rust
/// use lector_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_string("Smørrebrød", 10), "Smørrebrød");
        assert_eq!(truncate_string("Smørrebrød er godt", 8), "Smørr...");
    }

    #[test]
    fn test_truncate_tiny_width() {
        assert_eq!(truncate_string("Hello", 2), "...");
    }
}
