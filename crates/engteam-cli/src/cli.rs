//! CLI argument definitions for engineering-team.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use engteam_ledger::StackItem;

/// engineering-team -- install agent and skill bundles into a project.
#[derive(Parser)]
#[command(
    name = "engineering-team",
    version,
    about = "Install engineering agents and skills into a project's .claude directory",
    long_about = "Copies the selected agents, and the skills they depend on, from a bundle \
                  into <project>/.claude and records what was installed in \
                  engineering-team.db so later runs can update or prune them."
)]
pub struct Cli {
    /// Project directory. Defaults to the current directory.
    #[arg(long, short = 'C', global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Bundle root containing `agents/` and `skills/`.
    #[arg(long, global = true, env = "ENGINEERING_TEAM_BUNDLE", value_name = "PATH")]
    pub bundle: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a selection for the project and install it.
    Init {
        /// Agents to install (comma-separated).
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Skills to install in addition to the agents' own (comma-separated).
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,

        /// Project stack item, `type:name[@version]`. Repeatable.
        #[arg(long = "stack", value_name = "TYPE:NAME[@VERSION]")]
        stack: Vec<StackItem>,

        /// Replace the selection of an already initialized project.
        #[arg(long)]
        force: bool,
    },

    /// Re-install the stored selection from the bundle.
    Sync {
        /// Rewrite every resource even when it looks unchanged.
        #[arg(long)]
        force: bool,

        /// Delete installed resources that are no longer selected.
        #[arg(long)]
        prune: bool,

        /// Skip resources whose installed copy matches the bundle.
        #[arg(long)]
        skip_unchanged: bool,
    },

    /// List the agents and skills the bundle provides.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Only list agents.
        #[arg(long, conflicts_with = "skills")]
        agents: bool,

        /// Only list skills.
        #[arg(long)]
        skills: bool,
    },

    /// Show what is installed in the project.
    Status,
}
