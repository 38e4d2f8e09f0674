use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while extracting a document
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error in {}: {message}", file.display())]
    ParseError { file: PathBuf, message: String },

    /// A declaration whose doc block cannot be turned into directive lines.
    #[error("cannot read directives of `{declaration}`: {message}")]
    DirectiveError {
        declaration: String,
        message: String,
    },

    #[error("operation `{function}` has no queue directive")]
    MissingQueue { function: String },

    #[error("message `{0}` is declared more than once")]
    DuplicateMessage(String),

    #[error(
        "type `{name}` is declared in both {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateType {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("type name `{name}` is ambiguous, candidates: {}", candidates.join(", "))]
    AmbiguousType {
        name: String,
        candidates: Vec<String>,
    },
}
