use std::fmt;

pub(crate) type SpettroResult<T> = Result<T, Error>;

/// Errors that can occur during spettro usage
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A rule pattern failed to compile.
    /// Surfaces when a grammar is validated, never while tokenizing.
    #[allow(missing_docs)]
    InvalidPattern { pattern: String, reason: String },

    /// `insert_before` was given a key that does not exist in the grammar.
    UnknownKey(String),

    /// A grammar was not found in the registry.
    /// Only happens when asking to tokenize something with a grammar we can't find
    GrammarNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPattern { pattern, reason } => {
                write!(f, "invalid pattern '{}': {}", pattern, reason)
            }
            Error::UnknownKey(key) => write!(f, "key '{}' not found in grammar", key),
            Error::GrammarNotFound(name) => write!(f, "grammar '{}' not found", name),
        }
    }
}

impl std::error::Error for Error {}
