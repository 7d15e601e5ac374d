//! Error kinds surfaced by the score core.

use std::path::PathBuf;
use thiserror::Error;

/// A submission or query that the caller has to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing score data")]
    MissingScore,
    #[error("Score must be an integer")]
    NotAnInteger,
    #[error("Score must be at least {min}")]
    BelowMinimum { min: i64 },
    #[error("Score cannot exceed {max}")]
    AboveMaximum { max: i64 },
    #[error("Timestamp must be a string")]
    TimestampNotString,
    #[error("Invalid JSON body")]
    InvalidJson,
}

/// Failures of the backing score file.
///
/// `Read` and `Corrupt` are recovered inside [`crate::ScoreStore::load`];
/// only the strict `try_load` path returns them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read scores file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse scores file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("write scores file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize scores: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Error returned by leaderboard operations.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T, E = ScoreError> = std::result::Result<T, E>;
