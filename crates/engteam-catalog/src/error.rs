//! Error types for the catalog.
//!
//! Every variant is an integrity failure of the bundle itself: the scan
//! aborts before any resolve or sync can run.

use std::path::PathBuf;

use crate::types::ResourceKind;

/// Catalog integrity errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("bundle root not found: `{}`", .0.display())]
    BundleNotFound(PathBuf),

    #[error("missing header block in `{}` (must start with ---)", path.display())]
    MissingHeader { path: PathBuf },

    #[error("invalid header in `{}`: {reason}", path.display())]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("missing required field `{field}` in header of `{}`", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("invalid {what} `{value}` in `{}`: {reason}", path.display())]
    InvalidName {
        path: PathBuf,
        what: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error(
        "duplicate {kind} name `{name}` declared by `{}` and `{}`",
        first.display(),
        second.display()
    )]
    DuplicateName {
        kind: ResourceKind,
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("agent `{agent}` requires skill `{skill}`, which is not in the bundle")]
    DanglingDependency { agent: String, skill: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CatalogError>;
