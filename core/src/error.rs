use thiserror::Error;

/// Errors surfaced by the search core.
///
/// Missing terms, phrases, or proximity pairs are never errors; they resolve
/// to empty result sets.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Malformed query string: trailing `NOT`, unterminated phrase or
    /// proximity construct.
    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    /// A line in a persisted index file that is neither a valid header nor a
    /// valid indented posting line for the current parsing state.
    #[error("index format error at line {line}: {msg}")]
    IndexFormat { line: usize, msg: String },

    /// A field qualifier outside the configured field set, under the
    /// `Reject` policy.
    #[error("unknown field qualifier: {0}")]
    UnknownField(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub(crate) fn format(line: usize, msg: impl Into<String>) -> Self {
        SearchError::IndexFormat {
            line,
            msg: msg.into(),
        }
    }
}
