//! Content fingerprints (hex SHA-256) of resource payloads.
//!
//! A skill's fingerprint covers `SKILL.md` and every regular file under
//! `references/` and `assets/`, keyed by relative path, so the bundle copy
//! and the installed copy hash identically.

use std::path::{Path, PathBuf};

use engteam_catalog::{ResourceKind, SKILL_DOCUMENT, SKILL_SUBTREES};
use ring::digest;

use crate::error::MaterializeError;

/// Fingerprint a payload rooted at `path` (a file for agents, a directory
/// for skills).
pub fn fingerprint(kind: ResourceKind, path: &Path) -> Result<String, MaterializeError> {
    match kind {
        ResourceKind::Agent => fingerprint_document(path),
        ResourceKind::Skill => fingerprint_skill(path),
    }
}

pub fn fingerprint_document(path: &Path) -> Result<String, MaterializeError> {
    let content = std::fs::read(path).map_err(MaterializeError::io(path))?;
    Ok(hex::encode(digest::digest(&digest::SHA256, &content)))
}

pub fn fingerprint_skill(root: &Path) -> Result<String, MaterializeError> {
    let mut ctx = digest::Context::new(&digest::SHA256);
    for relative in payload_files(root)? {
        let path = root.join(&relative);
        let content = std::fs::read(&path).map_err(MaterializeError::io(&path))?;
        ctx.update(portable(&relative).as_bytes());
        ctx.update(&[0]);
        ctx.update(&(content.len() as u64).to_le_bytes());
        ctx.update(&content);
    }
    Ok(hex::encode(ctx.finish()))
}

/// Relative paths of every file in a skill payload, sorted.
pub(crate) fn payload_files(root: &Path) -> Result<Vec<PathBuf>, MaterializeError> {
    let document = root.join(SKILL_DOCUMENT);
    if !document.is_file() {
        return Err(MaterializeError::MissingSource { path: document });
    }

    let mut files = vec![PathBuf::from(SKILL_DOCUMENT)];
    for subtree in SKILL_SUBTREES {
        let dir = root.join(subtree);
        if !dir.is_dir() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|source| MaterializeError::Walk {
                path: dir.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `/`-joined form of a relative path, identical on every platform.
fn portable(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
