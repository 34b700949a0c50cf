//! CLI entry point for engineering-team.
//!
//! This binary provides the `engineering-team` command: `init` and `sync`
//! install a selection into a project, `list` shows the bundle, `status`
//! shows what a project has installed.

mod catalog_commands;
mod cli;
mod helpers;
mod project_commands;
mod settings;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::catalog_commands::{ListFilter, cmd_list};
use crate::cli::{Cli, Commands};
use crate::project_commands::{InitArgs, SyncArgs, cmd_init, cmd_status, cmd_sync};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let project_root = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let settings = settings::load_settings(&project_root)?;
    helpers::init_tracing(helpers::log_level(cli.verbose, &settings.log_level));

    let bundle_root = helpers::resolve_bundle_root(cli.bundle.as_deref(), &settings, &project_root);
    debug!(bundle = %bundle_root.display(), project = %project_root.display(), "starting");
    let catalog = engteam_catalog::scan(&bundle_root)
        .with_context(|| format!("failed to load bundle from {}", bundle_root.display()))?;

    match cli.command {
        Commands::Init {
            agents,
            skills,
            stack,
            force,
        } => cmd_init(
            &catalog,
            &project_root,
            &settings,
            InitArgs {
                agents,
                skills,
                stack,
                force,
            },
        ),
        Commands::Sync {
            force,
            prune,
            skip_unchanged,
        } => cmd_sync(
            &catalog,
            &project_root,
            &settings,
            SyncArgs {
                force,
                prune,
                skip_unchanged,
            },
        ),
        Commands::List {
            json,
            agents,
            skills,
        } => {
            cmd_list(&catalog, ListFilter::from_flags(agents, skills), json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            cmd_status(&catalog, &project_root)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
