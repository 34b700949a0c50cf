//! SQLite connection setup for the ledger file.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::LedgerResult;

/// Open (or create) the ledger database and apply pragmas.
pub fn open(path: &Path) -> LedgerResult<Connection> {
    debug!(path = %path.display(), "opening ledger database");
    let conn = Connection::open(path)?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Open an existing ledger database without creating it.
pub fn open_existing(path: &Path) -> LedgerResult<Connection> {
    debug!(path = %path.display(), "opening existing ledger database");
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Create an in-memory database for tests.
#[cfg(test)]
pub fn open_in_memory() -> LedgerResult<Connection> {
    let conn = Connection::open_in_memory()?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection) -> LedgerResult<()> {
    // The ledger lives in user repositories, so keep it a single file:
    // rollback journal instead of WAL, full sync on commit.
    conn.pragma_update(None, "journal_mode", "DELETE")?;
    conn.pragma_update(None, "synchronous", "FULL")?;

    conn.pragma_update(None, "foreign_keys", "ON")?;

    // Busy timeout so a reader racing a committing writer waits instead of failing.
    conn.pragma_update(None, "busy_timeout", 5_000_i32)?;

    Ok(())
}
