//! Segment command handler.
//!
//! Shows where each sentence of a text is found, without speaking it.

use lector_voice::position::byte_offset;
use lector_voice::{PositionMap, map_positions_from, split_sentences};

use crate::commands::SourceArgs;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};
use crate::utils::input::read_source;

/// Segment and map `text` the same way `speak --from` would.
pub fn segment_text(text: &str, from: usize) -> PositionMap {
    let tail = &text[byte_offset(text, from)..];
    let sentences = split_sentences(tail.trim());
    map_positions_from(text, &sentences, from)
}

/// Execute the segment command.
pub fn execute(source: &SourceArgs) -> Result<(), CliError> {
    let text = read_source(source.file.as_deref())?;
    let map = segment_text(&text, source.from);

    if source.json {
        for unit in &map.units {
            let line = serde_json::to_string(unit)
                .map_err(|e| CliError::Io(format!("failed to encode sentence: {e}")))?;
            println!("{line}");
        }
        for skipped in &map.skipped {
            let line = serde_json::json!({ "skipped": skipped.index, "text": skipped.text });
            println!("{line}");
        }
        return Ok(());
    }

    if map.units.is_empty() && map.skipped.is_empty() {
        println!("No sentences found.");
        return Ok(());
    }

    println!("Found {} sentence(s):\n", map.units.len());
    println!("{:<5} {:<8} {:<8} Text", "#", "Start", "End");
    print_separator(80);
    for (index, unit) in map.units.iter().enumerate() {
        println!(
            "{:<5} {:<8} {:<8} {}",
            index,
            unit.start_offset,
            unit.end_offset,
            truncate_string(unit.text.trim(), 56)
        );
    }

    if !map.skipped.is_empty() {
        println!();
        println!("Skipped {} sentence(s) not found in the text:", map.skipped.len());
        for skipped in &map.skipped {
            println!("  #{} {}", skipped.index, truncate_string(skipped.text.trim(), 70));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_whole_text() {
        let map = segment_text("Hello world. How are you?", 0);
        let ranges: Vec<_> = map
            .units
            .iter()
            .map(|u| (u.start_offset, u.end_offset))
            .collect();
        assert_eq!(ranges, vec![(0, 12), (13, 25)]);
        assert!(map.skipped.is_empty());
    }

    #[test]
    fn test_segment_from_offset_keeps_full_text_coordinates() {
        let map = segment_text("Hello world. How are you?", 13);
        assert_eq!(map.units.len(), 1);
        assert_eq!(map.units[0].text, "How are you?");
        assert_eq!(map.units[0].start_offset, 13);
    }

    #[test]
    fn test_segment_past_end_is_empty() {
        let map = segment_text("Short.", 100);
        assert!(map.units.is_empty());
    }
}
