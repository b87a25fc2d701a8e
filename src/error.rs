/// Errors that can occur while parsing, building an automaton, or matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("invalid pattern: the root must be a labelled node, not a wildcard")]
    InvalidPattern,

    #[error("invalid subject: {0}")]
    InvalidSubject(&'static str),

    #[error("traversal cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn syntax(offset: usize, message: impl ToString) -> Self {
        Error::Syntax {
            offset,
            message: message.to_string(),
        }
    }
}
