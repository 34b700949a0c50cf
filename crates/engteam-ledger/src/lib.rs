//! # engteam-ledger
//!
//! Per-project ledger for engineering-team: the single source of truth for
//! which agents and skills a project has installed.
//!
//! The ledger is one SQLite file at `<project>/engineering-team.db`:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  ProjectLedger  (load / mutate / commit) │
//! ├──────────────────────────────────────────┤
//! │  installed_resources   selections        │
//! │  project_stack         project_meta      │
//! ├──────────────────────────────────────────┤
//! │  Migrations (versioned, transactional)   │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Mutations are buffered in memory and become durable only in
//! [`ProjectLedger::commit`], inside one transaction. Callers serialize
//! access across processes with [`LedgerLock`].
//!
//! ```ignore
//! use engteam_ledger::{LedgerLock, ProjectLedger, DEFAULT_LOCK_TIMEOUT};
//!
//! let mut lock = LedgerLock::open(project_root)?;
//! let _guard = lock.acquire(DEFAULT_LOCK_TIMEOUT)?;
//! let mut ledger = ProjectLedger::load(project_root)?;
//! ledger.record_removed(&key);
//! ledger.commit()?;
//! ```

pub mod db;
pub mod error;
pub mod ledger;
pub mod legacy;
pub mod lock;
pub mod migration;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{LedgerError, LedgerResult};
pub use ledger::{LEDGER_FILE_NAME, ProjectLedger};
pub use legacy::{LEGACY_CONFIG_NAME, LegacyConfig, read_legacy_config};
pub use lock::{DEFAULT_LOCK_TIMEOUT, LOCK_FILE_NAME, LedgerLock, LedgerLockGuard};
pub use types::{InstalledRecord, ProjectMeta, Selection, StackItem};
