//! Integration tests for the engteam-ledger crate.
//!
//! These tests exercise the load / mutate / commit lifecycle against a real
//! SQLite file on disk (via tempfile).

use std::path::{Path, PathBuf};

use engteam_catalog::{Payload, ResourceDescriptor, ResourceKey, ResourceKind};
use engteam_ledger::{
    LEDGER_FILE_NAME, LEGACY_CONFIG_NAME, ProjectLedger, Selection, migration,
};

fn skill(name: &str) -> ResourceDescriptor {
    ResourceDescriptor {
        kind: ResourceKind::Skill,
        name: name.into(),
        description: "test skill".into(),
        category: Some("languages".into()),
        dependencies: Vec::new(),
        model: None,
        tools: None,
        payload: Payload::Directory {
            root: PathBuf::from(name),
            has_references: false,
            has_assets: false,
        },
    }
}

fn install(ledger: &mut ProjectLedger, name: &str, fingerprint: &str) {
    ledger.record_installed(
        &skill(name),
        fingerprint,
        "0.3.0",
        PathBuf::from(format!(".claude/skills/languages/{name}")),
    );
}

fn committed(project: &Path, names: &[&str]) {
    let mut ledger = ProjectLedger::load(project).unwrap();
    for name in names {
        install(&mut ledger, name, "f0");
    }
    ledger.commit().unwrap();
}

// ═══════════════════════════════════════════════════════════════════════
//  Durability
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn uncommitted_mutations_leave_disk_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    committed(dir.path(), &["rust", "go"]);
    let before = std::fs::read(dir.path().join(LEDGER_FILE_NAME)).unwrap();

    {
        let mut ledger = ProjectLedger::load(dir.path()).unwrap();
        install(&mut ledger, "python", "f1");
        install(&mut ledger, "rust", "f2");
        ledger.record_removed(&ResourceKey::skill("go"));
        ledger.set_selection(Selection::new(["x"], ["y"]));
        // dropped without commit
    }

    let after = std::fs::read(dir.path().join(LEDGER_FILE_NAME)).unwrap();
    assert_eq!(before, after);

    let ledger = ProjectLedger::load(dir.path()).unwrap();
    let names: Vec<String> = ledger
        .installed_snapshot()
        .into_iter()
        .map(|k| k.name)
        .collect();
    assert_eq!(names, vec!["go", "rust"]);
    assert_eq!(
        ledger
            .record(&ResourceKey::skill("rust"))
            .unwrap()
            .content_fingerprint,
        "f0"
    );
}

#[test]
fn commit_applies_upserts_and_removals_together() {
    let dir = tempfile::tempdir().unwrap();
    committed(dir.path(), &["rust", "go"]);

    let mut ledger = ProjectLedger::load(dir.path()).unwrap();
    install(&mut ledger, "rust", "f2");
    ledger.record_removed(&ResourceKey::skill("go"));
    ledger.commit().unwrap();

    let ledger = ProjectLedger::load(dir.path()).unwrap();
    assert_eq!(
        ledger.installed_snapshot(),
        [ResourceKey::skill("rust")].into_iter().collect()
    );
    let rust = ledger.record(&ResourceKey::skill("rust")).unwrap();
    assert_eq!(rust.content_fingerprint, "f2");
    assert_eq!(rust.category.as_deref(), Some("languages"));
}

// ═══════════════════════════════════════════════════════════════════════
//  Forward compatibility
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn ledger_from_newer_version_is_readable_and_writable() {
    let dir = tempfile::tempdir().unwrap();
    committed(dir.path(), &["rust"]);

    {
        let conn = rusqlite::Connection::open(dir.path().join(LEDGER_FILE_NAME)).unwrap();
        conn.execute_batch(
            "ALTER TABLE installed_resources ADD COLUMN pinned INTEGER NOT NULL DEFAULT 0;
             UPDATE installed_resources SET pinned = 1;
             INSERT INTO installed_resources
                (kind, name, category, install_path, installed_at, tool_version, content_fingerprint)
                VALUES ('command', 'deploy', NULL, '.claude/commands/deploy.md', 0, '9.0.0', 'x');
             INSERT INTO _migrations (version, description, applied_at) VALUES (42, 'future', 0);",
        )
        .unwrap();
    }

    let mut ledger = ProjectLedger::load(dir.path()).unwrap();
    assert_eq!(ledger.schema_version(), 42);
    assert_eq!(
        ledger.installed_snapshot(),
        [ResourceKey::skill("rust")].into_iter().collect()
    );

    install(&mut ledger, "rust", "f9");
    ledger.commit().unwrap();

    let conn = rusqlite::Connection::open(dir.path().join(LEDGER_FILE_NAME)).unwrap();
    let (pinned, fingerprint): (i64, String) = conn
        .query_row(
            "SELECT pinned, content_fingerprint FROM installed_resources WHERE name = 'rust'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(pinned, 1);
    assert_eq!(fingerprint, "f9");

    let version = migration::current_version(&conn).unwrap();
    assert_eq!(version, 42);
}

// ═══════════════════════════════════════════════════════════════════════
//  Legacy import
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn legacy_config_seeds_selection_once() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join(LEGACY_CONFIG_NAME);
    std::fs::write(
        &legacy,
        r#"{"version": "1.0", "agents": ["backend"], "skills": ["rust"],
            "installedAt": "2024-01-02T03:04:05Z", "cliVersion": "0.1.0"}"#,
    )
    .unwrap();

    let mut ledger = ProjectLedger::load(dir.path()).unwrap();
    assert_eq!(ledger.selection(), &Selection::new(["backend"], ["rust"]));
    assert!(ledger.is_dirty());
    assert!(ledger.installed_snapshot().is_empty());
    ledger.commit().unwrap();

    assert!(legacy.exists());
    let ledger = ProjectLedger::load(dir.path()).unwrap();
    assert_eq!(ledger.selection(), &Selection::new(["backend"], ["rust"]));
    assert_eq!(
        ledger.meta().created_at.map(|ts| ts.to_rfc3339()),
        Some("2024-01-02T03:04:05+00:00".to_string())
    );
}

#[test]
fn existing_ledger_wins_over_legacy_config() {
    let dir = tempfile::tempdir().unwrap();
    committed(dir.path(), &[]);
    std::fs::write(
        dir.path().join(LEGACY_CONFIG_NAME),
        r#"{"agents": ["stale"], "skills": []}"#,
    )
    .unwrap();

    let ledger = ProjectLedger::load(dir.path()).unwrap();
    assert!(ledger.selection().is_empty());
    assert!(ProjectLedger::exists(dir.path()));
}
