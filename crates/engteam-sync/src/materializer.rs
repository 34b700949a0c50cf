//! File materializer: copies resource payloads into a project's `.claude/`
//! tree and deletes them again.
//!
//! Writes never expose a half-copied resource. Agents are written to a
//! temporary file in the destination directory and persisted by rename.
//! Skills are staged in a hidden temporary directory next to the
//! destination, then swapped in; the previous copy is moved aside first and
//! restored if the swap fails. The staging directory is removed on every
//! exit path.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use engteam_catalog::{Payload, ResourceDescriptor};
use engteam_ledger::InstalledRecord;
use tracing::{debug, warn};

use crate::error::MaterializeError;
use crate::fingerprint::{self, payload_files};

/// Destination root, relative to the project.
pub const DEST_DIR_NAME: &str = ".claude";

/// Result of one successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Fingerprint of the payload as written.
    pub fingerprint: String,
    /// Destination relative to the project root.
    pub install_path: PathBuf,
}

/// Filesystem side of a sync.
pub trait Materializer {
    /// Copy `descriptor`'s payload into place, replacing any previous copy.
    fn write(&mut self, descriptor: &ResourceDescriptor) -> Result<Materialized, MaterializeError>;

    /// Delete an installed resource. Already-missing files are not an error.
    fn remove(&mut self, record: &InstalledRecord) -> Result<(), MaterializeError>;

    /// Fingerprint of the payload in the bundle.
    fn source_fingerprint(&self, descriptor: &ResourceDescriptor)
    -> Result<String, MaterializeError>;

    /// Fingerprint of what is currently installed, `None` if nothing is.
    fn installed_fingerprint(
        &self,
        record: &InstalledRecord,
    ) -> Result<Option<String>, MaterializeError>;
}

/// [`Materializer`] backed by the real filesystem under `<project>/.claude`.
#[derive(Debug, Clone)]
pub struct FsMaterializer {
    project_root: PathBuf,
}

impl FsMaterializer {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Project-relative destination for `descriptor`.
    pub fn install_path(descriptor: &ResourceDescriptor) -> PathBuf {
        Path::new(DEST_DIR_NAME).join(descriptor.relative_destination())
    }

    /// Resolve a project-relative install path, rejecting anything that
    /// would land outside `.claude/`.
    fn absolute(&self, install_path: &Path) -> Result<PathBuf, MaterializeError> {
        let mut components = install_path.components();
        let rooted = matches!(components.next(), Some(Component::Normal(c)) if c == DEST_DIR_NAME);
        let nested = components.clone().next().is_some();
        let clean = components.all(|c| matches!(c, Component::Normal(_)));
        if !(rooted && nested && clean) {
            return Err(MaterializeError::OutsideDestination {
                path: install_path.to_path_buf(),
            });
        }
        Ok(self.project_root.join(install_path))
    }

    fn write_document(&self, source: &Path, dest: &Path) -> Result<(), MaterializeError> {
        let parent = parent_of(dest)?;
        std::fs::create_dir_all(parent).map_err(MaterializeError::io(parent))?;

        let mut input = File::open(source).map_err(MaterializeError::io(source))?;
        let mut staged = tempfile::Builder::new()
            .prefix(".staging-")
            .tempfile_in(parent)
            .map_err(MaterializeError::io(parent))?;
        std::io::copy(&mut input, staged.as_file_mut()).map_err(MaterializeError::io(source))?;
        staged
            .as_file()
            .sync_all()
            .map_err(MaterializeError::io(staged.path()))?;

        staged.persist(dest).map_err(|e| MaterializeError::Io {
            path: dest.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    fn write_directory(&self, source: &Path, dest: &Path) -> Result<(), MaterializeError> {
        let parent = parent_of(dest)?;
        std::fs::create_dir_all(parent).map_err(MaterializeError::io(parent))?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(parent)
            .map_err(MaterializeError::io(parent))?;
        let staged = staging.path().join("next");
        let previous = staging.path().join("previous");

        for relative in payload_files(source)? {
            let from = source.join(&relative);
            let to = staged.join(&relative);
            let dir = parent_of(&to)?;
            std::fs::create_dir_all(dir).map_err(MaterializeError::io(dir))?;
            std::fs::copy(&from, &to).map_err(MaterializeError::io(&from))?;
        }

        let replacing = dest.exists();
        if replacing {
            std::fs::rename(dest, &previous).map_err(MaterializeError::io(dest))?;
        }
        if let Err(e) = std::fs::rename(&staged, dest) {
            if replacing {
                if let Err(restore) = std::fs::rename(&previous, dest) {
                    warn!(
                        path = %dest.display(),
                        error = %restore,
                        "failed to restore previous copy"
                    );
                }
            }
            return Err(MaterializeError::Io {
                path: dest.to_path_buf(),
                source: e,
            });
        }

        // `staging` (holding `previous`) is removed on drop.
        Ok(())
    }
}

impl Materializer for FsMaterializer {
    fn write(&mut self, descriptor: &ResourceDescriptor) -> Result<Materialized, MaterializeError> {
        let install_path = Self::install_path(descriptor);
        let dest = self.absolute(&install_path)?;

        match &descriptor.payload {
            Payload::Document { path } => self.write_document(path, &dest)?,
            Payload::Directory { root, .. } => self.write_directory(root, &dest)?,
        }

        let fingerprint = fingerprint::fingerprint(descriptor.kind, &dest)?;
        debug!(
            resource = %descriptor.key(),
            path = %install_path.display(),
            "materialized"
        );
        Ok(Materialized {
            fingerprint,
            install_path,
        })
    }

    fn remove(&mut self, record: &InstalledRecord) -> Result<(), MaterializeError> {
        let path = self.absolute(&record.install_path)?;
        let result = match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&path),
            Ok(_) => std::fs::remove_file(&path),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                debug!(resource = %record.key(), path = %path.display(), "removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(resource = %record.key(), "already absent");
                Ok(())
            }
            Err(source) => Err(MaterializeError::Io { path, source }),
        }
    }

    fn source_fingerprint(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<String, MaterializeError> {
        match &descriptor.payload {
            Payload::Document { path } => fingerprint::fingerprint_document(path),
            Payload::Directory { root, .. } => fingerprint::fingerprint_skill(root),
        }
    }

    fn installed_fingerprint(
        &self,
        record: &InstalledRecord,
    ) -> Result<Option<String>, MaterializeError> {
        let path = self.absolute(&record.install_path)?;
        if !path.exists() {
            return Ok(None);
        }
        fingerprint::fingerprint(record.kind, &path).map(Some)
    }
}

fn parent_of(path: &Path) -> Result<&Path, MaterializeError> {
    path.parent()
        .ok_or_else(|| MaterializeError::OutsideDestination {
            path: path.to_path_buf(),
        })
}
