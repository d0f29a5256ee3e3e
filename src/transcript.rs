//! Append-only interview transcript
//!
//! Writes `You: …` / `AI: …` lines to a flat log file. The log is write-only:
//! nothing in the program reads it back. Assistant text is reduced to ASCII
//! before writing, matching the historical log format.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Result;

/// Append-only transcript log
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    /// Create a log writer for `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a candidate turn, written verbatim
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written.
    pub fn record_user(&self, text: &str) -> Result<()> {
        self.append(&format!("You: {text}\n"))
    }

    /// Append an assistant turn with non-ASCII characters stripped
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written.
    pub fn record_assistant(&self, text: &str) -> Result<()> {
        self.append(&format!("AI: {}\n", strip_non_ascii(text)))
    }

    fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Drop every non-ASCII character from `text`
#[must_use]
pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_non_ascii_from_assistant_text() {
        assert_eq!(strip_non_ascii("O(n\u{b2}) — really?"), "O(n)  really?");
        assert_eq!(strip_non_ascii("plain ascii"), "plain ascii");
        assert_eq!(strip_non_ascii(""), "");
    }

    #[test]
    fn appends_turns_in_order() {
        let dir = std::env::temp_dir().join(format!("transcript-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let log = TranscriptLog::new(dir.join("interview_log.txt"));

        log.record_user("I'd sort the array first").unwrap();
        log.record_assistant("Why does sorting help here?").unwrap();
        log.record_user("it groups duplicates \u{2713}").unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "You: I'd sort the array first\n\
             AI: Why does sorting help here?\n\
             You: it groups duplicates \u{2713}\n"
        );

        std::fs::remove_dir_all(&dir).ok();
    }
}
