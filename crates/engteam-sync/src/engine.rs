//! `sync_project`: one locked load / reconcile / commit cycle.

use std::path::Path;
use std::time::Duration;

use engteam_catalog::{Catalog, ResourceKind};
use engteam_ledger::{DEFAULT_LOCK_TIMEOUT, LedgerLock, ProjectLedger, Selection, StackItem};
use tracing::{info, warn};

use crate::error::SyncResult;
use crate::materializer::FsMaterializer;
use crate::plan::SyncOptions;
use crate::reconciler::{Reconciler, SyncReport};
use crate::resolver::{ResolvedSet, resolve};

/// Version recorded in the ledger by this build.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Inputs of one project sync.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// New selection to store before syncing; `None` re-syncs the stored one.
    pub selection: Option<Selection>,
    /// New stack items to store; `None` keeps the stored ones.
    pub stack: Option<Vec<StackItem>>,
    pub options: SyncOptions,
    pub lock_timeout: Duration,
    pub tool_version: String,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            selection: None,
            stack: None,
            options: SyncOptions::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            tool_version: TOOL_VERSION.to_owned(),
        }
    }
}

/// Result of [`sync_project`].
#[derive(Debug)]
pub struct SyncOutcome {
    /// Selection actually synced (stale names dropped).
    pub selection: Selection,
    pub desired: ResolvedSet,
    pub report: SyncReport,
}

/// Sync `project_root` against `catalog`.
///
/// Holds the project lock for the whole cycle. Lock, ledger and unknown
/// resource errors abort before anything is written.
pub fn sync_project(
    catalog: &Catalog,
    project_root: &Path,
    request: SyncRequest,
) -> SyncResult<SyncOutcome> {
    // Explicit requests must name known resources; stored ones may be stale.
    if let Some(selection) = &request.selection {
        resolve(catalog, &selection.agents, &selection.skills)?;
    }

    let mut lock = LedgerLock::open(project_root)?;
    let _guard = lock.acquire(request.lock_timeout)?;

    let mut ledger = ProjectLedger::load(project_root)?;
    if let Some(selection) = request.selection {
        ledger.set_selection(selection);
    }
    if let Some(stack) = request.stack {
        ledger.set_stack(stack);
    }

    let selection = retain_known(catalog, ledger.selection());
    ledger.set_selection(selection.clone());

    let desired = resolve(catalog, &selection.agents, &selection.skills)?;
    info!(
        project = %project_root.display(),
        agents = desired.agents.len(),
        skills = desired.skills.len(),
        "syncing project"
    );

    let mut reconciler = Reconciler::new(
        catalog,
        FsMaterializer::new(project_root),
        request.tool_version,
    );
    let report = reconciler.sync(&desired, &mut ledger, request.options)?;

    Ok(SyncOutcome {
        selection,
        desired,
        report,
    })
}

/// Drop stored names the bundle no longer ships.
fn retain_known(catalog: &Catalog, selection: &Selection) -> Selection {
    let mut kept = Selection::default();
    for kind in [ResourceKind::Agent, ResourceKind::Skill] {
        for name in selection.names(kind) {
            if catalog.lookup(kind, name).is_some() {
                match kind {
                    ResourceKind::Agent => kept.agents.insert(name.clone()),
                    ResourceKind::Skill => kept.skills.insert(name.clone()),
                };
            } else {
                warn!(kind = %kind, name = %name, "selected resource no longer in bundle, dropping");
            }
        }
    }
    kept
}
