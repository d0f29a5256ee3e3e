//! System clipboard access
//!
//! Reads candidate-supplied text (code snippets, problem statements) from the
//! system clipboard for context injection.

use crate::{Error, Result};

/// Prefix applied to clipboard text before context injection
pub const CLIPBOARD_CONTEXT_PREFIX: &str = "User added from clipboard:";

/// Read the current clipboard text
///
/// # Errors
///
/// Returns `Error::Clipboard` if the clipboard cannot be accessed, and
/// `Error::InvalidInput` if it holds no text or only whitespace.
pub fn read_text() -> Result<String> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;

    let content = clipboard
        .get_text()
        .map_err(|e| Error::Clipboard(e.to_string()))?;

    if content.trim().is_empty() {
        return Err(Error::InvalidInput("clipboard is empty".to_string()));
    }

    tracing::info!(chars = content.len(), "read clipboard text");
    Ok(content)
}

/// Format clipboard content as a context block
#[must_use]
pub fn context_block(content: &str) -> String {
    format!("{CLIPBOARD_CONTEXT_PREFIX}\n{content}")
}
