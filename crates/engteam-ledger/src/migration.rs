//! Schema migration system.
//!
//! Migrations are stored as static SQL strings keyed by version number.
//! The current version is tracked in a `_migrations` table so migrations
//! are idempotent and only run once. A ledger written by a newer tool
//! (higher version than [`LATEST_VERSION`]) is left untouched.

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};

/// A single migration definition.
struct Migration {
    /// Monotonically increasing version number (1, 2, 3, ...).
    version: u32,
    /// Human-readable description.
    description: &'static str,
    /// Raw SQL to execute. May contain multiple statements separated by `;`.
    sql: &'static str,
}

/// All migrations in order. Add new migrations to the end of this array.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "initial schema: project metadata, installed resources, selection",
        sql: r#"
            CREATE TABLE project_meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE installed_resources (
                kind                TEXT NOT NULL,
                name                TEXT NOT NULL,
                category            TEXT,
                install_path        TEXT NOT NULL,
                installed_at        INTEGER NOT NULL,
                tool_version        TEXT NOT NULL,
                content_fingerprint TEXT NOT NULL,
                PRIMARY KEY (kind, name)
            );

            CREATE TABLE selections (
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (kind, name)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "project stack items",
        sql: r#"
            CREATE TABLE project_stack (
                stack_type TEXT NOT NULL,
                name       TEXT NOT NULL,
                version    TEXT,
                PRIMARY KEY (stack_type, name)
            );
        "#,
    },
];

/// Latest schema version this build knows how to write.
pub const LATEST_VERSION: u32 = 2;

/// Run all pending migrations against `conn`.
///
/// Returns the schema version the database is at afterwards.
pub fn run_all(conn: &Connection) -> LedgerResult<u32> {
    ensure_migrations_table(conn)?;

    let current = current_version(conn)?;
    if current > LATEST_VERSION {
        warn!(
            current_version = current,
            known_version = LATEST_VERSION,
            "ledger was written by a newer version, skipping migrations"
        );
        return Ok(current);
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        debug!(current_version = current, "ledger schema is up to date");
        return Ok(current);
    }

    info!(
        current_version = current,
        pending = pending.len(),
        "running pending migrations"
    );

    for migration in pending {
        apply(conn, migration)?;
    }

    Ok(LATEST_VERSION)
}

/// Return the latest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> LedgerResult<u32> {
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )
        .map_err(migration_error(0, "failed to read current version"))?;
    Ok(version)
}

/// Whether the `_migrations` table exists (false for a foreign SQLite file).
pub fn is_initialized(conn: &Connection) -> LedgerResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = '_migrations'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ── internals ────────────────────────────────────────────────────────

fn ensure_migrations_table(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version     INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at  INTEGER NOT NULL
        );",
    )
    .map_err(migration_error(0, "failed to create _migrations table"))
}

/// Apply a single migration inside an immediate transaction.
///
/// The schema change and its `_migrations` row commit together; dropping
/// the transaction on any error rolls both back.
fn apply(conn: &Connection, migration: &Migration) -> LedgerResult<()> {
    let version = migration.version;
    info!(
        version,
        description = migration.description,
        "applying migration"
    );

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(migration_error(version, "failed to begin transaction"))?;

    let applied = tx
        .execute_batch(migration.sql)
        .map_err(migration_error(version, "SQL execution failed"))
        .and_then(|()| {
            tx.execute(
                "INSERT INTO _migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
                params![version, migration.description, chrono::Utc::now().timestamp()],
            )
            .map(|_| ())
            .map_err(migration_error(version, "failed to record migration"))
        });
    if let Err(err) = applied {
        warn!(version, %err, "migration failed, rolling back");
        return Err(err);
    }

    tx.commit()
        .map_err(migration_error(version, "failed to commit"))?;
    debug!(version, "migration applied");
    Ok(())
}

fn migration_error(version: u32, stage: &str) -> impl FnOnce(rusqlite::Error) -> LedgerError + '_ {
    move |e| LedgerError::Migration {
        version,
        message: format!("{stage}: {e}"),
    }
}

// ── tests ────────────────────────────────────────────────────────────
