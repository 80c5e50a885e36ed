use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A configured path is empty.
    #[error("path #{index} is invalid: path must not be empty")]
    InvalidPath { index: usize },

    /// A file is missing, unreadable, or not UTF-8.
    #[error("unable to load file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidRow(#[from] RowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A row that is neither a comment, a blank line, nor a valid assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}row {line} '{content}' is not valid: {kind}", location(.path))]
pub struct RowError {
    /// 1-based line number.
    pub line: usize,
    /// Raw text of the offending row.
    pub content: String,
    pub kind: RowErrorKind,
    pub path: Option<PathBuf>,
}

impl RowError {
    pub(crate) fn new(line: usize, content: &str, kind: RowErrorKind) -> Self {
        Self {
            line,
            content: content.to_owned(),
            kind,
            path: None,
        }
    }

    pub(crate) fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.path = path;
        self
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!("{}: ", path.display()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    #[error("missing `=` separator")]
    MissingSeparator,
    #[error("missing name")]
    EmptyName,
    #[error("invalid name")]
    InvalidName,
    #[error("contains a NUL byte")]
    NulByte,
}
