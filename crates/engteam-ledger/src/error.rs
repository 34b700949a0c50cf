//! Error types for the engteam-ledger crate.
//!
//! All ledger operations return [`LedgerError`] via [`LedgerResult`].

use std::path::PathBuf;

use thiserror::Error;

/// Alias for `Result<T, LedgerError>`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur while loading or committing a project ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON deserialization of a legacy config failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema migration failed.
    #[error("migration v{version} failed: {message}")]
    Migration { version: u32, message: String },

    /// Another process holds the project lock.
    #[error("project ledger is locked by another process (lock file `{}`)", path.display())]
    Locked { path: PathBuf },

    /// A stored row could not be interpreted.
    #[error("invalid ledger row in `{table}`: {message}")]
    InvalidRow { table: &'static str, message: String },

    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
