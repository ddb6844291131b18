//! Error types for the quiz catalog core

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the content store boundary
#[derive(Debug, Error)]
pub enum ContentError {
    /// No bundled content of this kind for the language
    #[error("No {kind} content for language '{language}'")]
    NotFound {
        /// Which content file was looked up
        kind: &'static str,
        /// Requested language code
        language: String,
    },

    /// Reading a bundled content file failed
    #[error("Failed to read {path:?}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A content file was not valid for its record type
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl ContentError {
    /// Whether the caller should treat this as "nothing upstream" rather than a fault
    pub fn is_missing(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

/// Errors raised by the preferences store
#[derive(Debug, Error)]
pub enum PrefsError {
    /// Reading or flushing the preferences file failed
    #[error("Preferences IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The preferences file or an encoded value is not valid JSON
    #[error("Preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A key holds a value of a different scalar type
    #[error("Preference '{key}' is not a {expected}")]
    TypeMismatch {
        /// Offending key
        key: String,
        /// Type the caller asked for
        expected: &'static str,
    },

    /// The background writer task has stopped
    #[error("Preferences writer stopped")]
    WriterGone,
}

/// Errors raised while deriving quiz view state
#[derive(Debug, Error)]
pub enum QuizzesError {
    /// A quiz definition breaks a data-model invariant
    #[error("Quiz '{quiz_id}' is invalid: {reason}")]
    InvalidQuiz {
        /// Quiz identifier
        quiz_id: String,
        /// What is wrong with it
        reason: String,
    },

    /// Two quizzes in one catalog share an id
    #[error("Quiz id '{0}' appears more than once in the catalog")]
    DuplicateQuiz(String),

    /// A level code other than L, M or H
    #[error("Unknown quiz level '{0}'")]
    UnknownLevel(String),

    /// The intent loop has shut down
    #[error("Quizzes worker is no longer running")]
    WorkerGone,
}
