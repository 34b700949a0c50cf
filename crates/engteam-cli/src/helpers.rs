//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, bundle root resolution, and sync
//! report printing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use engteam_sync::SyncReport;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Bundle directory name looked up next to the binary and in the cwd.
const DEFAULT_BUNDLE_DIR: &str = "data";

/// Exit status of a sync that completed with per-resource failures.
const PARTIAL_FAILURE_EXIT: u8 = 2;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// `RUST_LOG` overrides the default. Output goes to stderr so stdout stays
/// usable for `list --json`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Level implied by `-v` flags, falling back to the configured one.
pub fn log_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// ---------------------------------------------------------------------------
// Bundle location
// ---------------------------------------------------------------------------

/// Pick the bundle root.
///
/// Order: `--bundle` / `ENGINEERING_TEAM_BUNDLE`, the settings file, a
/// `data/` directory next to the executable, then `./data`.
pub fn resolve_bundle_root(
    explicit: Option<&Path>,
    settings: &Settings,
    project_root: &Path,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = settings.bundle_root(project_root) {
        return path;
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_BUNDLE_DIR)));
    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => {
            debug!("no bundle next to the executable, using ./data");
            PathBuf::from(DEFAULT_BUNDLE_DIR)
        }
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Print a sync report and map it to the process exit status.
pub fn print_report(report: &SyncReport) -> ExitCode {
    let sections = [
        ("added", &report.added),
        ("updated", &report.updated),
        ("unchanged", &report.unchanged),
        ("removed", &report.removed),
        ("kept (not selected, use --prune to remove)", &report.retained),
    ];
    for (label, keys) in sections {
        if keys.is_empty() {
            continue;
        }
        println!("  {label}:");
        for key in keys {
            println!("    {key}");
        }
    }

    if report.failed.is_empty() {
        if !report.has_changes() {
            println!("  Everything up to date.");
        }
        return ExitCode::SUCCESS;
    }

    println!("  failed:");
    for failure in &report.failed {
        println!("    {}: {}", failure.key, failure.error);
    }
    ExitCode::from(PARTIAL_FAILURE_EXIT)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
