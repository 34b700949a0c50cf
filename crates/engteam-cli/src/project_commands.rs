//! Project subcommands: `init`, `sync` and `status`.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use engteam_catalog::Catalog;
use engteam_ledger::{LEGACY_CONFIG_NAME, ProjectLedger, Selection, StackItem};
use engteam_sync::{SyncOptions, SyncRequest, auto_added_skills, resolve, sync_project};
use tracing::info;

use crate::helpers::print_report;
use crate::settings::Settings;

// ═══════════════════════════════════════════════════════════════════════
//  init
// ═══════════════════════════════════════════════════════════════════════

/// Arguments of `init`.
pub struct InitArgs {
    pub agents: Vec<String>,
    pub skills: Vec<String>,
    pub stack: Vec<StackItem>,
    pub force: bool,
}

pub fn cmd_init(
    catalog: &Catalog,
    project_root: &Path,
    settings: &Settings,
    args: InitArgs,
) -> Result<ExitCode> {
    if ProjectLedger::exists(project_root) && !args.force {
        bail!(
            "{} is already initialized; pass --force to replace its selection",
            project_root.display()
        );
    }
    if args.agents.is_empty() && args.skills.is_empty() {
        bail!("nothing selected; pass --agents and/or --skills");
    }

    let selection = Selection::new(args.agents, args.skills);
    let resolved = resolve(catalog, &selection.agents, &selection.skills)?;
    let auto = auto_added_skills(catalog, &resolved, &selection.skills);
    if !auto.is_empty() {
        println!("  Skills added for the selected agents:");
        for (skill, agents) in &auto {
            println!("    {skill} (needed by {})", agents.join(", "));
        }
    }

    info!(
        project = %project_root.display(),
        agents = selection.agents.len(),
        skills = selection.skills.len(),
        "initializing project"
    );
    let request = SyncRequest {
        selection: Some(selection),
        stack: (!args.stack.is_empty()).then_some(args.stack),
        options: SyncOptions {
            prune: settings.sync.prune,
            ..SyncOptions::default()
        },
        lock_timeout: settings.sync.lock_timeout(),
        ..SyncRequest::default()
    };
    let outcome = sync_project(catalog, project_root, request)
        .with_context(|| format!("failed to initialize {}", project_root.display()))?;

    println!(
        "  Installed {} agent(s) and {} skill(s) into {}",
        outcome.desired.agents.len(),
        outcome.desired.skills.len(),
        project_root.join(engteam_sync::DEST_DIR_NAME).display()
    );
    Ok(print_report(&outcome.report))
}

// ═══════════════════════════════════════════════════════════════════════
//  sync
// ═══════════════════════════════════════════════════════════════════════

/// Flags of `sync`. Each one only turns the setting on.
pub struct SyncArgs {
    pub force: bool,
    pub prune: bool,
    pub skip_unchanged: bool,
}

pub fn cmd_sync(
    catalog: &Catalog,
    project_root: &Path,
    settings: &Settings,
    args: SyncArgs,
) -> Result<ExitCode> {
    if !ProjectLedger::exists(project_root) && !project_root.join(LEGACY_CONFIG_NAME).is_file() {
        bail!(
            "{} has no engineering-team ledger; run `engineering-team init` first",
            project_root.display()
        );
    }

    let request = SyncRequest {
        options: sync_options(settings, &args),
        lock_timeout: settings.sync.lock_timeout(),
        ..SyncRequest::default()
    };
    let outcome = sync_project(catalog, project_root, request)
        .with_context(|| format!("failed to sync {}", project_root.display()))?;

    if outcome.selection.is_empty() {
        println!("  Nothing selected.");
    }
    Ok(print_report(&outcome.report))
}

fn sync_options(settings: &Settings, args: &SyncArgs) -> SyncOptions {
    SyncOptions {
        force: args.force,
        prune: args.prune || settings.sync.prune,
        skip_unchanged: args.skip_unchanged || settings.sync.skip_unchanged,
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  status
// ═══════════════════════════════════════════════════════════════════════

pub fn cmd_status(catalog: &Catalog, project_root: &Path) -> Result<()> {
    if !ProjectLedger::exists(project_root) {
        println!("  {} is not initialized.", project_root.display());
        return Ok(());
    }
    let ledger = ProjectLedger::load(project_root)
        .with_context(|| format!("failed to read ledger in {}", project_root.display()))?;

    let meta = ledger.meta();
    println!();
    println!("  Project:   {}", meta.name.as_deref().unwrap_or("-"));
    println!("  Path:      {}", project_root.display());
    println!("  Version:   {}", meta.tool_version.as_deref().unwrap_or("-"));
    if let Some(updated) = meta.updated_at {
        println!("  Updated:   {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Ledger:    {}", ledger.db_path().display());
    println!("  Schema:    v{}", ledger.schema_version());

    let stack: Vec<String> = ledger.stack().map(ToString::to_string).collect();
    if !stack.is_empty() {
        println!("  Stack:     {}", stack.join(", "));
    }
    let selection = ledger.selection();
    println!("  Selected:  {}", describe_selection(selection));

    let stale = stale_records(catalog, &ledger);
    println!();
    println!("  Installed");
    println!("  =========");
    for record in ledger.records() {
        let marker = if stale.contains(&record.key()) {
            "  (not in bundle)"
        } else if !project_root.join(&record.install_path).exists() {
            "  (missing on disk)"
        } else {
            ""
        };
        println!(
            "  {:<36} {}{marker}",
            record.key().to_string(),
            record.installed_at.format("%Y-%m-%d")
        );
    }
    if !stale.is_empty() {
        println!();
        println!("  {} record(s) no longer in the bundle; `sync --prune` removes them.", stale.len());
    }
    println!();
    Ok(())
}

fn describe_selection(selection: &Selection) -> String {
    if selection.is_empty() {
        return "nothing".to_string();
    }
    let mut parts = Vec::new();
    if !selection.agents.is_empty() {
        parts.push(format!(
            "agents {}",
            selection.agents.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    if !selection.skills.is_empty() {
        parts.push(format!(
            "skills {}",
            selection.skills.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    parts.join("; ")
}

/// Installed records the catalog no longer resolves.
fn stale_records(
    catalog: &Catalog,
    ledger: &ProjectLedger,
) -> BTreeSet<engteam_catalog::ResourceKey> {
    ledger
        .records()
        .map(|r| r.key())
        .filter(|key| !catalog.contains(key))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
