//! Error types for the engteam-sync crate.
//!
//! [`SyncError`] halts an invocation before any write. [`MaterializeError`]
//! is per resource: the reconciler collects it into the report and moves on.

use std::path::PathBuf;

use engteam_catalog::{CatalogError, ResourceKind};
use engteam_ledger::LedgerError;
use thiserror::Error;

/// Alias for `Result<T, SyncError>`.
pub type SyncResult<T> = Result<T, SyncError>;

/// Fatal errors for one resolve or sync call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A requested name does not exist in the catalog.
    #[error("unknown {kind} `{name}`")]
    UnknownResource { kind: ResourceKind, name: String },

    /// The bundle failed its integrity checks.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The ledger could not be locked, read or committed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Failure to copy or delete one resource's files.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("io error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk `{}`: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("refusing to touch `{}`: outside the destination root", path.display())]
    OutsideDestination { path: PathBuf },

    #[error("resource source missing: `{}`", path.display())]
    MissingSource { path: PathBuf },
}

impl MaterializeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
