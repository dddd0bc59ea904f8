//! Custom error types for climblog

use thiserror::Error;

/// Main error type for climblog operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Video not found: {0}")]
    VideoNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Not initialized: run 'climblog init' first")]
    NotInitialized,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),
}

/// Coarse classification callers use to pick a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input; nothing was written.
    Validation,
    /// The referenced video does not exist.
    NotFound,
    /// The database failed or returned data that could not be decoded.
    Storage,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::VideoNotFound(_) => ErrorKind::NotFound,
            Error::Storage(_) | Error::CorruptRecord { .. } => ErrorKind::Storage,
            Error::Config(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::NotInitialized
            | Error::AlreadyInitialized(_) => ErrorKind::Config,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Only storage faults that depend on timing qualify: a busy or locked
    /// database, an exhausted pool, or an I/O failure talking to the file.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Storage(sqlx::Error::PoolTimedOut) | Error::Storage(sqlx::Error::Io(_)) => true,
            Error::Storage(sqlx::Error::Database(db)) => db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes
                .map(|code| matches!(code & 0xff, 5 | 6))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Result type alias for climblog
pub type Result<T> = std::result::Result<T, Error>;
