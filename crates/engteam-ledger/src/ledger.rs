//! The project ledger: durable record of what is installed in one project.
//!
//! [`ProjectLedger::load`] reads the current state into memory without
//! writing anything. Every mutation is buffered until
//! [`ProjectLedger::commit`], which applies them in a single SQLite
//! transaction. Dropping a ledger without committing leaves the file on
//! disk exactly as it was.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use engteam_catalog::{ResourceDescriptor, ResourceKey, ResourceKind};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::db;
use crate::error::{LedgerError, LedgerResult};
use crate::legacy;
use crate::migration;
use crate::types::{InstalledRecord, ProjectMeta, Selection, StackItem};

/// Ledger database file name, at the project root.
pub const LEDGER_FILE_NAME: &str = "engineering-team.db";

/// Schema version that introduced `project_stack`.
const STACK_SCHEMA_VERSION: u32 = 2;

/// Mutations recorded since load.
#[derive(Debug, Default)]
struct Pending {
    upserts: BTreeMap<ResourceKey, InstalledRecord>,
    removals: BTreeSet<ResourceKey>,
    selection: bool,
    stack: bool,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty() && !self.selection && !self.stack
    }
}

/// In-memory view of one project's ledger.
#[derive(Debug)]
pub struct ProjectLedger {
    project_root: PathBuf,
    db_path: PathBuf,
    /// Schema version on disk at load time; 0 when no ledger exists yet.
    schema_version: u32,
    records: BTreeMap<ResourceKey, InstalledRecord>,
    selection: Selection,
    stack: BTreeMap<(String, String), StackItem>,
    meta: ProjectMeta,
    pending: Pending,
}

impl ProjectLedger {
    /// Whether a ledger database exists under `project_root`.
    pub fn exists(project_root: &Path) -> bool {
        project_root.join(LEDGER_FILE_NAME).is_file()
    }

    /// Read the ledger for `project_root`.
    ///
    /// A missing ledger is not an error: the result is empty, seeded from a
    /// legacy JSON config when one is present.
    pub fn load(project_root: &Path) -> LedgerResult<Self> {
        let db_path = project_root.join(LEDGER_FILE_NAME);
        let mut ledger = Self {
            project_root: project_root.to_path_buf(),
            db_path: db_path.clone(),
            schema_version: 0,
            records: BTreeMap::new(),
            selection: Selection::default(),
            stack: BTreeMap::new(),
            meta: ProjectMeta::default(),
            pending: Pending::default(),
        };

        if db_path.is_file() {
            let conn = db::open_existing(&db_path)?;
            if migration::is_initialized(&conn)? {
                ledger.schema_version = migration::current_version(&conn)?;
                ledger.read_state(&conn)?;
            }
            info!(
                path = %db_path.display(),
                schema_version = ledger.schema_version,
                records = ledger.records.len(),
                "ledger loaded"
            );
        } else if let Some(config) = legacy::read_legacy_config(project_root)? {
            ledger.selection = config.selection();
            ledger.meta.created_at = config.installed_at();
            ledger.meta.tool_version = config.cli_version.clone();
            ledger.pending.selection = true;
            info!(
                agents = ledger.selection.agents.len(),
                skills = ledger.selection.skills.len(),
                "ledger seeded from legacy config"
            );
        } else {
            debug!(path = %db_path.display(), "no ledger yet, starting empty");
        }

        Ok(ledger)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Schema version found on disk at load time (0 if none).
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Whether there are mutations not yet committed.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    // ── installed records ────────────────────────────────────────────

    /// Upsert the record for a freshly materialized resource.
    pub fn record_installed(
        &mut self,
        descriptor: &ResourceDescriptor,
        content_fingerprint: impl Into<String>,
        tool_version: &str,
        install_path: PathBuf,
    ) {
        let record = InstalledRecord {
            kind: descriptor.kind,
            name: descriptor.name.clone(),
            category: descriptor.category.clone(),
            install_path,
            installed_at: Utc::now(),
            tool_version: tool_version.to_owned(),
            content_fingerprint: content_fingerprint.into(),
        };
        let key = record.key();
        debug!(resource = %key, "recording installed");

        self.pending.removals.remove(&key);
        self.pending.upserts.insert(key.clone(), record.clone());
        self.records.insert(key, record);
    }

    /// Drop the record for `key`. Unknown keys are ignored.
    pub fn record_removed(&mut self, key: &ResourceKey) {
        debug!(resource = %key, "recording removed");
        self.pending.upserts.remove(key);
        if self.records.remove(key).is_some() {
            self.pending.removals.insert(key.clone());
        }
    }

    /// Keys of every tracked resource, including uncommitted changes.
    pub fn installed_snapshot(&self) -> BTreeSet<ResourceKey> {
        self.records.keys().cloned().collect()
    }

    pub fn record(&self, key: &ResourceKey) -> Option<&InstalledRecord> {
        self.records.get(key)
    }

    /// Records in (kind, name) order.
    pub fn records(&self) -> impl Iterator<Item = &InstalledRecord> {
        self.records.values()
    }

    // ── selection, stack, metadata ───────────────────────────────────

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        if self.selection != selection {
            self.selection = selection;
            self.pending.selection = true;
        }
    }

    /// Stack items ordered by type then name.
    pub fn stack(&self) -> impl Iterator<Item = &StackItem> {
        self.stack.values()
    }

    /// Add or replace the item with the same type and name.
    pub fn add_stack_item(&mut self, item: StackItem) {
        self.stack
            .insert((item.stack_type.clone(), item.name.clone()), item);
        self.pending.stack = true;
    }

    pub fn set_stack(&mut self, items: impl IntoIterator<Item = StackItem>) {
        self.stack.clear();
        for item in items {
            self.add_stack_item(item);
        }
        self.pending.stack = true;
    }

    pub fn clear_stack(&mut self) {
        self.set_stack(std::iter::empty());
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    /// Stamp the tool version written with the next commit.
    pub fn set_tool_version(&mut self, tool_version: &str) {
        self.meta.tool_version = Some(tool_version.to_owned());
    }

    // ── commit ───────────────────────────────────────────────────────

    /// Make every buffered mutation durable in one transaction.
    ///
    /// Creates and migrates the database on first commit. On error nothing
    /// is written and the buffered mutations are kept.
    pub fn commit(&mut self) -> LedgerResult<()> {
        let mut conn = db::open(&self.db_path)?;
        let version = migration::run_all(&conn)?;

        let now = Utc::now();
        let meta = ProjectMeta {
            name: self.meta.name.clone().or_else(|| {
                self.project_root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            }),
            path: self
                .meta
                .path
                .clone()
                .or_else(|| Some(self.project_root.display().to_string())),
            created_at: self.meta.created_at.or(Some(now)),
            updated_at: Some(now),
            tool_version: self.meta.tool_version.clone(),
        };

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_meta(&tx, &meta)?;

        for key in &self.pending.removals {
            tx.execute(
                "DELETE FROM installed_resources WHERE kind = ?1 AND name = ?2",
                params![key.kind.as_str(), key.name],
            )?;
        }

        for record in self.pending.upserts.values() {
            tx.execute(
                "INSERT INTO installed_resources
                    (kind, name, category, install_path, installed_at, tool_version, content_fingerprint)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (kind, name) DO UPDATE SET
                    category = excluded.category,
                    install_path = excluded.install_path,
                    installed_at = excluded.installed_at,
                    tool_version = excluded.tool_version,
                    content_fingerprint = excluded.content_fingerprint",
                params![
                    record.kind.as_str(),
                    record.name,
                    record.category,
                    record.install_path.to_string_lossy().into_owned(),
                    record.installed_at.timestamp(),
                    record.tool_version,
                    record.content_fingerprint,
                ],
            )?;
        }

        if self.pending.selection {
            tx.execute("DELETE FROM selections", [])?;
            for kind in [ResourceKind::Agent, ResourceKind::Skill] {
                for name in self.selection.names(kind) {
                    tx.execute(
                        "INSERT INTO selections (kind, name) VALUES (?1, ?2)",
                        params![kind.as_str(), name],
                    )?;
                }
            }
        }

        if self.pending.stack {
            tx.execute("DELETE FROM project_stack", [])?;
            for item in self.stack.values() {
                tx.execute(
                    "INSERT INTO project_stack (stack_type, name, version) VALUES (?1, ?2, ?3)",
                    params![item.stack_type, item.name, item.version],
                )?;
            }
        }

        tx.commit()?;

        info!(
            path = %self.db_path.display(),
            upserts = self.pending.upserts.len(),
            removals = self.pending.removals.len(),
            "ledger committed"
        );
        self.pending = Pending::default();
        self.meta = meta;
        self.schema_version = version;
        Ok(())
    }

    // ── internals ────────────────────────────────────────────────────

    fn read_state(&mut self, conn: &Connection) -> LedgerResult<()> {
        self.meta = read_meta(conn)?;

        let mut stmt = conn.prepare(
            "SELECT kind, name, category, install_path, installed_at, tool_version, content_fingerprint
             FROM installed_resources",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        for row in rows {
            let (kind, name, category, install_path, installed_at, tool_version, fingerprint) =
                row?;
            let Some(kind) = ResourceKind::parse(&kind) else {
                warn!(kind = %kind, name = %name, "ignoring ledger row of unknown kind");
                continue;
            };
            let installed_at = timestamp(installed_at, "installed_resources")?;
            let record = InstalledRecord {
                kind,
                name,
                category,
                install_path: PathBuf::from(install_path),
                installed_at,
                tool_version,
                content_fingerprint: fingerprint,
            };
            self.records.insert(record.key(), record);
        }

        let mut stmt = conn.prepare("SELECT kind, name FROM selections")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (kind, name) = row?;
            match ResourceKind::parse(&kind) {
                Some(ResourceKind::Agent) => {
                    self.selection.agents.insert(name);
                }
                Some(ResourceKind::Skill) => {
                    self.selection.skills.insert(name);
                }
                None => warn!(kind = %kind, name = %name, "ignoring selection of unknown kind"),
            }
        }

        if self.schema_version >= STACK_SCHEMA_VERSION {
            let mut stmt = conn.prepare("SELECT stack_type, name, version FROM project_stack")?;
            let rows = stmt.query_map([], |row| {
                Ok(StackItem {
                    stack_type: row.get(0)?,
                    name: row.get(1)?,
                    version: row.get(2)?,
                })
            })?;
            for row in rows {
                let item = row?;
                self.stack
                    .insert((item.stack_type.clone(), item.name.clone()), item);
            }
        }

        Ok(())
    }
}

fn timestamp(secs: i64, table: &'static str) -> LedgerResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| LedgerError::InvalidRow {
        table,
        message: format!("timestamp {secs} out of range"),
    })
}

fn read_meta(conn: &Connection) -> LedgerResult<ProjectMeta> {
    let get = |key: &str| -> LedgerResult<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM project_meta WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?)
    };
    let date = |key: &str| -> LedgerResult<Option<DateTime<Utc>>> {
        match get(key)? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|ts| Some(ts.with_timezone(&Utc)))
                .map_err(|e| LedgerError::InvalidRow {
                    table: "project_meta",
                    message: format!("{key}: {e}"),
                }),
        }
    };

    Ok(ProjectMeta {
        name: get("name")?,
        path: get("path")?,
        created_at: date("created_at")?,
        updated_at: date("updated_at")?,
        tool_version: get("tool_version")?,
    })
}

fn write_meta(conn: &Connection, meta: &ProjectMeta) -> LedgerResult<()> {
    let entries = [
        ("name", meta.name.clone()),
        ("path", meta.path.clone()),
        ("created_at", meta.created_at.map(|ts| ts.to_rfc3339())),
        ("updated_at", meta.updated_at.map(|ts| ts.to_rfc3339())),
        ("tool_version", meta.tool_version.clone()),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            conn.execute(
                "INSERT INTO project_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
    }
    Ok(())
}
