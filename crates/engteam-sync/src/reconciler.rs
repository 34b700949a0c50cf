//! The reconciler: drives the materializer from a plan and records the
//! outcome in the ledger.
//!
//! Per-resource failures never abort the run. They are collected in
//! [`SyncReport::failed`] and the ledger is committed once at the end with
//! whatever succeeded.

use engteam_catalog::{Catalog, ResourceKey};
use engteam_ledger::ProjectLedger;
use tracing::{debug, info, warn};

use crate::error::{MaterializeError, SyncResult};
use crate::materializer::Materializer;
use crate::plan::{SyncOptions, SyncPlan};
use crate::resolver::ResolvedSet;

/// One resource that could not be written or removed.
#[derive(Debug)]
pub struct SyncFailure {
    pub key: ResourceKey,
    pub error: MaterializeError,
}

/// What one sync did.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub added: Vec<ResourceKey>,
    pub updated: Vec<ResourceKey>,
    /// Skipped because the installed copy matched the bundle.
    pub unchanged: Vec<ResourceKey>,
    pub removed: Vec<ResourceKey>,
    /// Out of the desired set but kept because pruning was off.
    pub retained: Vec<ResourceKey>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether anything on disk changed.
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty())
    }
}

/// Applies a desired set to one project.
pub struct Reconciler<'c, M> {
    catalog: &'c Catalog,
    materializer: M,
    tool_version: String,
}

impl<'c, M: Materializer> Reconciler<'c, M> {
    pub fn new(catalog: &'c Catalog, materializer: M, tool_version: impl Into<String>) -> Self {
        Self {
            catalog,
            materializer,
            tool_version: tool_version.into(),
        }
    }

    /// Compute the plan without touching anything.
    pub fn plan(
        &self,
        desired: &ResolvedSet,
        ledger: &ProjectLedger,
        options: SyncOptions,
    ) -> SyncPlan {
        SyncPlan::compute(
            &desired.keys(),
            &ledger.installed_snapshot(),
            options,
            |key| self.is_unchanged(key, ledger),
        )
    }

    /// Bring the project in line with `desired` and commit the ledger.
    ///
    /// Returns `Err` only when the ledger commit fails; materialization
    /// failures are reported per resource.
    pub fn sync(
        &mut self,
        desired: &ResolvedSet,
        ledger: &mut ProjectLedger,
        options: SyncOptions,
    ) -> SyncResult<SyncReport> {
        let plan = self.plan(desired, ledger, options);
        info!(
            add = plan.to_add.len(),
            update = plan.to_update.len(),
            unchanged = plan.unchanged.len(),
            remove = plan.to_remove.len(),
            prune = options.prune,
            "sync planned"
        );

        if plan.is_noop() {
            debug!("nothing to write or remove");
        }

        let mut report = SyncReport {
            unchanged: plan.unchanged,
            ..SyncReport::default()
        };

        for key in plan.to_add {
            match self.write(&key, ledger) {
                Ok(()) => report.added.push(key),
                Err(error) => fail(&mut report, key, error),
            }
        }
        for key in plan.to_update {
            match self.write(&key, ledger) {
                Ok(()) => report.updated.push(key),
                Err(error) => fail(&mut report, key, error),
            }
        }

        if options.prune {
            for key in plan.to_remove {
                match self.remove(&key, ledger) {
                    Ok(()) => report.removed.push(key),
                    Err(error) => fail(&mut report, key, error),
                }
            }
        } else {
            report.retained = plan.to_remove;
        }

        ledger.set_tool_version(&self.tool_version);
        ledger.commit()?;

        info!(
            added = report.added.len(),
            updated = report.updated.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "sync finished"
        );
        Ok(report)
    }

    fn write(&mut self, key: &ResourceKey, ledger: &mut ProjectLedger) -> Result<(), MaterializeError> {
        // Desired keys come from `resolve`, so they are always in the catalog.
        let Some(descriptor) = self.catalog.get(key) else {
            return Err(MaterializeError::MissingSource {
                path: key.to_string().into(),
            });
        };
        let written = self.materializer.write(descriptor)?;

        // A skill that changed category lands at a new path; drop the old copy.
        let moved = ledger
            .record(key)
            .filter(|previous| previous.install_path != written.install_path)
            .cloned();
        if let Some(previous) = moved {
            debug!(
                resource = %key,
                from = %previous.install_path.display(),
                to = %written.install_path.display(),
                "install path changed, removing previous copy"
            );
            self.materializer.remove(&previous)?;
        }

        ledger.record_installed(
            descriptor,
            written.fingerprint,
            &self.tool_version,
            written.install_path,
        );
        Ok(())
    }

    fn remove(&mut self, key: &ResourceKey, ledger: &mut ProjectLedger) -> Result<(), MaterializeError> {
        if let Some(record) = ledger.record(key) {
            self.materializer.remove(record)?;
        }
        ledger.record_removed(key);
        Ok(())
    }

    /// Installed copy matches both the ledger and the bundle.
    fn is_unchanged(&self, key: &ResourceKey, ledger: &ProjectLedger) -> bool {
        let (Some(descriptor), Some(record)) = (self.catalog.get(key), ledger.record(key)) else {
            return false;
        };
        if record.category != descriptor.category {
            return false;
        }
        let source = match self.materializer.source_fingerprint(descriptor) {
            Ok(fp) => fp,
            Err(e) => {
                debug!(resource = %key, error = %e, "cannot fingerprint source");
                return false;
            }
        };
        let installed = self.materializer.installed_fingerprint(record).ok().flatten();
        record.content_fingerprint == source && installed.as_deref() == Some(source.as_str())
    }
}

fn fail(report: &mut SyncReport, key: ResourceKey, error: MaterializeError) {
    warn!(resource = %key, %error, "resource failed");
    report.failed.push(SyncFailure { key, error });
}

// ── tests ──
