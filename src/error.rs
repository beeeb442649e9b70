//! Error types for the tic-tac-toe learning crate

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("position {position} is out of bounds (must be 0-8)")]
    InvalidPosition { position: usize },

    #[error("invalid mark '{value}' (expected 'O', 'X' or '.')")]
    InvalidMark { value: String },

    #[error("invalid move: position {position} is already occupied")]
    InvalidMove { position: usize },

    #[error("no single move explains the transition: {reason}")]
    AmbiguousTransition { reason: String },

    #[error("no valid moves available")]
    NoValidMoves,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("shared store is still referenced by {references} owners")]
    SharedStoreInUse { references: usize },

    #[error("background training worker panicked")]
    WorkerPanicked,

    #[error("invalid progress bar template: {message}")]
    ProgressBarTemplate { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for caller contract violations (bad position or mark).
    ///
    /// These are bugs in the caller and are never recovered from.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPosition { .. } | Error::InvalidMark { .. }
        )
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(Error::InvalidPosition { position: 9 }.is_precondition_violation());
        assert!(
            Error::InvalidMark {
                value: "Z".to_string()
            }
            .is_precondition_violation()
        );
        assert!(!Error::InvalidMove { position: 4 }.is_precondition_violation());
        assert!(!Error::NoValidMoves.is_precondition_violation());
    }

    #[test]
    fn test_messages_name_the_position() {
        let err = Error::InvalidMove { position: 4 };
        assert!(err.to_string().contains("occupied"));
        assert!(err.to_string().contains('4'));
    }
}
