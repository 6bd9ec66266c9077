//! Reading the text to speak.

use std::io::{self, Read};
use std::path::Path;

use crate::error::CliError;

/// Whether `file` means "read stdin" (omitted or `-`).
pub fn is_stdin(file: Option<&Path>) -> bool {
    file.is_none_or(|path| path.as_os_str() == "-")
}

/// Read the whole source text.
///
/// Reads stdin when `file` is `None` or `-`. The text must be UTF-8.
pub fn read_source(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if !is_stdin(Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display()))),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::Io(format!("stdin: {e}")))?;
            Ok(text)
        }
    }
}
