//! # engteam-sync
//!
//! The reconciliation engine of engineering-team.
//!
//! ```text
//! Catalog ──► resolve ──► Reconciler ◄── ProjectLedger (load)
//!                              │
//!                              ├──► Materializer ──► <project>/.claude/
//!                              └──► ProjectLedger (commit)
//! ```
//!
//! - [`resolve`] expands requested agents into the skills they depend on.
//! - [`Reconciler`] diffs the desired set against the ledger, writes and
//!   removes payloads through a [`Materializer`], and commits the ledger
//!   once.
//! - [`sync_project`] wraps one locked load / reconcile / commit cycle.

pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod materializer;
pub mod plan;
pub mod reconciler;
pub mod resolver;

// ── re-exports ───────────────────────────────────────────────────────

pub use engine::{SyncOutcome, SyncRequest, TOOL_VERSION, sync_project};
pub use error::{MaterializeError, SyncError, SyncResult};
pub use materializer::{DEST_DIR_NAME, FsMaterializer, Materialized, Materializer};
pub use plan::{SyncOptions, SyncPlan};
pub use reconciler::{Reconciler, SyncFailure, SyncReport};
pub use resolver::{ResolvedSet, auto_added_skills, resolve};
