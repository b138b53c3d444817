use thiserror::Error;

/// Failure modes of the core. Every message is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed input found while parsing. Aborts the whole parse.
    #[error("{0}")]
    Syntax(String),

    /// A rule that has no negated form was handed to the negation.
    #[error("{0}")]
    Structural(String),

    /// The DNF expansion would need more clauses than fit in a `u64`.
    #[error("{0}")]
    Overflow(String),
}

impl Error {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Syntax(message) | Self::Structural(message) | Self::Overflow(message) => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
