//! Translate command handler.
//!
//! Picks the selection the way the reader would: an explicit text, a
//! character range, or the word under an offset.

use console::style;
use lector_voice::position::char_slice;
use lector_voice::{LanguagePair, translate_selection, word_at};

use crate::bootstrap::{build_translator, translate_settings};
use crate::commands::TranslateArgs;
use crate::error::CliError;
use crate::utils::input::read_source;

/// The text selected by `--at`/`--end` in `text`.
///
/// `--at` alone selects the word covering that offset (none when the offset
/// is not inside a word). Without offsets the whole text is the selection.
pub fn resolve_selection(text: &str, at: Option<usize>, end: Option<usize>) -> Option<String> {
    match (at, end) {
        (Some(start), Some(end)) => Some(char_slice(text, start, end).to_string()),
        (Some(offset), None) => word_at(text, offset).map(|word| word.text),
        (None, _) => Some(text.to_string()),
    }
}

/// Execute the translate command.
pub async fn execute(args: &TranslateArgs) -> Result<(), CliError> {
    let settings = translate_settings(args)?;

    let selection = match &args.text {
        Some(text) => Some(text.clone()),
        None => {
            let text = read_source(args.file.as_deref())?;
            resolve_selection(&text, args.at, args.end)
        }
    };

    let pair = LanguagePair::from(&settings);
    let translator = build_translator(&settings);
    let translation = translate_selection(translator.as_ref(), selection.as_deref(), &pair).await?;
    let selected = selection.as_deref().map_or("", str::trim);

    if args.json {
        let line = serde_json::json!({
            "text": selected,
            "translation": translation,
            "source": pair.source,
            "target": pair.target,
        });
        println!("{line}");
    } else {
        println!(
            "{} {} {}",
            style(selected).dim(),
            style(format!("({}→{})", pair.source, pair.target)).dim(),
            style(&translation).green().bold()
        );
    }

    Ok(())
}
