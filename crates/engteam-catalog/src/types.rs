//! Resource type definitions.
//!
//! A resource is either an agent (one markdown document) or a skill (a
//! directory holding `SKILL.md` plus optional `references/` and `assets/`
//! subtrees). Descriptors are built once per scan and never mutated.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::parser::Header;

/// Extension of every primary document in the bundle.
pub const DOC_EXTENSION: &str = "md";

/// File name of a skill's primary document.
pub const SKILL_DOCUMENT: &str = "SKILL.md";

/// Optional skill subtrees copied along with the primary document.
pub const SKILL_SUBTREES: [&str; 2] = ["references", "assets"];

/// The two resource partitions of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Agent,
    Skill,
}

impl ResourceKind {
    /// Stable lowercase identifier, also used as the ledger column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Skill => "skill",
        }
    }

    /// Parse the identifier produced by [`ResourceKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(Self::Agent),
            "skill" => Some(Self::Skill),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity of a resource: names are unique per kind only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn agent(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Agent, name)
    }

    pub fn skill(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Skill, name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Where a resource's files live inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A single primary document (agents).
    Document { path: PathBuf },

    /// A directory with the primary document and optional subtrees (skills).
    Directory {
        root: PathBuf,
        has_references: bool,
        has_assets: bool,
    },
}

impl Payload {
    /// Path of the primary document.
    pub fn document(&self) -> PathBuf {
        match self {
            Self::Document { path } => path.clone(),
            Self::Directory { root, .. } => root.join(SKILL_DOCUMENT),
        }
    }
}

/// One installable unit, validated at scan time.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    pub description: String,
    /// Skill grouping (`languages`, `frameworks`, ...). `None` for agents.
    pub category: Option<String>,
    /// Skill names an agent requires, in declaration order, deduplicated.
    pub dependencies: Vec<String>,
    /// Preferred model, agents only.
    pub model: Option<String>,
    /// Tool allow-list as written in the header, agents only.
    pub tools: Option<String>,
    pub payload: Payload,
}

impl ResourceDescriptor {
    /// Build an agent descriptor from its parsed header.
    ///
    /// Fails closed: a missing `name` or `description`, or a name that is not
    /// a safe path component, is an integrity error.
    pub fn from_agent_header(header: Header, path: &Path) -> Result<Self> {
        let name = required(header.name, "name", path)?;
        validate_component(&name, "agent name", path)?;
        let description = required(header.description, "description", path)?;

        let mut dependencies: Vec<String> = Vec::new();
        for skill in header.skills {
            validate_component(&skill, "skill reference", path)?;
            if !dependencies.contains(&skill) {
                dependencies.push(skill);
            }
        }

        Ok(Self {
            kind: ResourceKind::Agent,
            name,
            description,
            category: None,
            dependencies,
            model: header.model,
            tools: header.tools,
            payload: Payload::Document {
                path: path.to_path_buf(),
            },
        })
    }

    /// Build a skill descriptor from its parsed header and directory.
    ///
    /// Skills never declare dependencies; a `skills` field in a skill header
    /// is rejected so the graph stays two levels deep.
    pub fn from_skill_header(header: Header, category: &str, dir: &Path) -> Result<Self> {
        let document = dir.join(SKILL_DOCUMENT);
        let name = required(header.name, "name", &document)?;
        validate_component(&name, "skill name", &document)?;
        validate_component(category, "category", dir)?;
        let description = required(header.description, "description", &document)?;

        if !header.skills.is_empty() {
            return Err(CatalogError::InvalidHeader {
                path: document,
                reason: "skills cannot declare other skills".into(),
            });
        }

        Ok(Self {
            kind: ResourceKind::Skill,
            name,
            description,
            category: Some(category.to_owned()),
            dependencies: Vec::new(),
            model: None,
            tools: None,
            payload: Payload::Directory {
                root: dir.to_path_buf(),
                has_references: dir.join("references").is_dir(),
                has_assets: dir.join("assets").is_dir(),
            },
        })
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind, self.name.clone())
    }

    /// Destination relative to the project's `.claude` directory:
    /// `agents/<name>.md` or `skills/<category>/<name>`.
    pub fn relative_destination(&self) -> PathBuf {
        match (&self.kind, &self.category) {
            (ResourceKind::Skill, Some(category)) => {
                PathBuf::from("skills").join(category).join(&self.name)
            }
            (ResourceKind::Skill, None) => PathBuf::from("skills").join(&self.name),
            (ResourceKind::Agent, _) => {
                PathBuf::from("agents").join(format!("{}.{DOC_EXTENSION}", self.name))
            }
        }
    }

    pub fn has_references(&self) -> bool {
        matches!(
            self.payload,
            Payload::Directory {
                has_references: true,
                ..
            }
        )
    }

    pub fn has_assets(&self) -> bool {
        matches!(
            self.payload,
            Payload::Directory {
                has_assets: true,
                ..
            }
        )
    }
}

fn required(value: Option<String>, field: &'static str, path: &Path) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(CatalogError::MissingField {
            path: path.to_path_buf(),
            field,
        }),
    }
}

/// Names end up as path components under `.claude/`, so anything that could
/// escape or hide the destination is rejected.
pub(crate) fn validate_component(value: &str, what: &'static str, path: &Path) -> Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.starts_with('.') {
        Some("must not start with '.'")
    } else if value.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if value.chars().any(|c| c.is_control() || c == ':') {
        Some("must not contain control characters or ':'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CatalogError::InvalidName {
            path: path.to_path_buf(),
            what,
            value: value.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: Option<&str>, description: Option<&str>, skills: &[&str]) -> Header {
        Header {
            name: name.map(str::to_owned),
            description: description.map(str::to_owned),
            skills: skills.iter().map(|s| (*s).to_owned()).collect(),
            model: None,
            tools: None,
        }
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [ResourceKind::Agent, ResourceKind::Skill] {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("plugin"), None);
    }

    #[test]
    fn agent_dependencies_are_deduplicated_in_order() {
        let agent = ResourceDescriptor::from_agent_header(
            header(Some("backend"), Some("Builds APIs"), &["rust", "sql", "rust"]),
            Path::new("agents/backend.md"),
        )
        .unwrap();
        assert_eq!(agent.dependencies, vec!["rust", "sql"]);
        assert_eq!(
            agent.relative_destination(),
            PathBuf::from("agents/backend.md")
        );
    }

    #[test]
    fn missing_description_fails_closed() {
        let err = ResourceDescriptor::from_agent_header(
            header(Some("backend"), None, &[]),
            Path::new("agents/backend.md"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                field: "description",
                ..
            }
        ));
    }

    #[test]
    fn blank_name_counts_as_missing() {
        let err = ResourceDescriptor::from_agent_header(
            header(Some("   "), Some("x"), &[]),
            Path::new("agents/x.md"),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { field: "name", .. }));
    }

    #[test]
    fn unsafe_names_are_rejected() {
        for bad in ["../etc", ".hidden", "a/b", "a\\b"] {
            let result = ResourceDescriptor::from_agent_header(
                header(Some(bad), Some("x"), &[]),
                Path::new("agents/x.md"),
            );
            assert!(
                matches!(result, Err(CatalogError::InvalidName { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn skill_destination_is_scoped_by_category() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("rust");
        std::fs::create_dir_all(dir.join("references")).unwrap();

        let skill = ResourceDescriptor::from_skill_header(
            header(Some("rust"), Some("Rust guidance"), &[]),
            "languages",
            &dir,
        )
        .unwrap();
        assert_eq!(
            skill.relative_destination(),
            PathBuf::from("skills/languages/rust")
        );
        assert!(skill.has_references());
        assert!(!skill.has_assets());
        assert_eq!(skill.payload.document(), dir.join("SKILL.md"));
    }

    #[test]
    fn skills_cannot_depend_on_skills() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ResourceDescriptor::from_skill_header(
            header(Some("rust"), Some("Rust"), &["cargo"]),
            "languages",
            tmp.path(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidHeader { .. }));
    }
}
