//! Bundle scanner: walks the two bundle partitions and builds the catalog.
//!
//! ```text
//! <bundle>/
//!   agents/<name>.md
//!   skills/<category>/<name>/SKILL.md
//!   skills/<category>/<name>/references/...
//!   skills/<category>/<name>/assets/...
//! ```

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::parser::parse_header;
use crate::types::{DOC_EXTENSION, ResourceDescriptor, SKILL_DOCUMENT};

/// Scan a bundle root into a validated [`Catalog`].
///
/// A missing `agents/` or `skills/` partition is treated as empty. Any
/// malformed header, duplicate name, or dangling skill reference aborts the
/// scan.
pub fn scan(bundle_root: &Path) -> Result<Catalog> {
    if !bundle_root.is_dir() {
        return Err(CatalogError::BundleNotFound(bundle_root.to_path_buf()));
    }

    let mut descriptors = scan_agents(&bundle_root.join("agents"))?;
    descriptors.extend(scan_skills(&bundle_root.join("skills"))?);

    let catalog = Catalog::from_descriptors(bundle_root, descriptors)?;
    tracing::info!(
        root = %bundle_root.display(),
        agents = catalog.agents().count(),
        skills = catalog.skills().count(),
        "catalog scanned"
    );
    Ok(catalog)
}

/// Load every `agents/<name>.md` document.
fn scan_agents(dir: &Path) -> Result<Vec<ResourceDescriptor>> {
    if !dir.is_dir() {
        tracing::debug!(path = %dir.display(), "agents partition does not exist");
        return Ok(Vec::new());
    }

    let mut agents = Vec::new();
    for path in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(DOC_EXTENSION) {
            tracing::trace!(path = %path.display(), "not an agent document, skipping");
            continue;
        }

        let content = std::fs::read_to_string(&path)?;
        let header = parse_header(&content, &path)?;
        let agent = ResourceDescriptor::from_agent_header(header, &path)?;
        tracing::debug!(name = %agent.name, skills = agent.dependencies.len(), "loaded agent");
        agents.push(agent);
    }

    Ok(agents)
}

/// Load every `skills/<category>/<name>/SKILL.md` directory.
fn scan_skills(dir: &Path) -> Result<Vec<ResourceDescriptor>> {
    if !dir.is_dir() {
        tracing::debug!(path = %dir.display(), "skills partition does not exist");
        return Ok(Vec::new());
    }

    let mut skills = Vec::new();
    for category_dir in sorted_entries(dir)? {
        if !category_dir.is_dir() {
            continue;
        }
        let Some(category) = file_name(&category_dir) else {
            continue;
        };

        for skill_dir in sorted_entries(&category_dir)? {
            if !skill_dir.is_dir() {
                continue;
            }

            let document = skill_dir.join(SKILL_DOCUMENT);
            if !document.is_file() {
                tracing::warn!(path = %skill_dir.display(), "no SKILL.md, skipping");
                continue;
            }

            let content = std::fs::read_to_string(&document)?;
            let header = parse_header(&content, &document)?;
            let skill = ResourceDescriptor::from_skill_header(header, &category, &skill_dir)?;
            tracing::debug!(name = %skill.name, category = %category, "loaded skill");
            skills.push(skill);
        }
    }

    Ok(skills)
}

/// Directory entries sorted by name, hidden entries excluded.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if file_name(&path).is_some_and(|n| n.starts_with('.')) {
            continue;
        }
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceKind;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_bundle_root_fails() {
        let err = scan(Path::new("/nonexistent/bundle")).unwrap_err();
        assert!(matches!(err, CatalogError::BundleNotFound(_)));
    }

    #[test]
    fn empty_bundle_yields_empty_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let catalog = scan(tmp.path()).unwrap();
        assert_eq!(catalog.agents().count(), 0);
        assert_eq!(catalog.skills().count(), 0);
    }

    #[test]
    fn scans_agents_and_skills() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(
            &root.join("agents/backend.md"),
            "---\nname: backend\ndescription: Backend work\nskills: [rust]\n---\nBody",
        );
        write(&root.join("agents/README.txt"), "not an agent");
        write(
            &root.join("skills/languages/rust/SKILL.md"),
            "---\nname: rust\ndescription: Rust guidance\n---\nBody",
        );
        write(&root.join("skills/languages/rust/references/ownership.md"), "x");
        std::fs::create_dir_all(root.join("skills/languages/empty")).unwrap();
        write(&root.join("skills/.hidden/x/SKILL.md"), "garbage");

        let catalog = scan(root).unwrap();
        let backend = catalog.lookup(ResourceKind::Agent, "backend").unwrap();
        assert_eq!(backend.dependencies, vec!["rust"]);

        let rust = catalog.lookup(ResourceKind::Skill, "rust").unwrap();
        assert_eq!(rust.category.as_deref(), Some("languages"));
        assert!(rust.has_references());
        assert_eq!(catalog.skills().count(), 1);
    }

    #[test]
    fn malformed_agent_aborts_scan() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("agents/broken.md"), "no header here");
        let err = scan(tmp.path()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingHeader { .. }));
    }
}
