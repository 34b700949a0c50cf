//! Ledger row types.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use engteam_catalog::{ResourceKey, ResourceKind};
use serde::{Deserialize, Serialize};

/// One resource currently tracked for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRecord {
    pub kind: ResourceKind,
    pub name: String,
    /// Skill category at install time, `None` for agents.
    pub category: Option<String>,
    /// Destination relative to the project root, e.g. `.claude/agents/x.md`.
    pub install_path: PathBuf,
    pub installed_at: DateTime<Utc>,
    pub tool_version: String,
    /// Hex SHA-256 of the materialized payload.
    pub content_fingerprint: String,
}

impl InstalledRecord {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind, self.name.clone())
    }
}

/// Names the user explicitly chose, before dependency expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub agents: BTreeSet<String>,
    pub skills: BTreeSet<String>,
}

impl Selection {
    pub fn new(
        agents: impl IntoIterator<Item = impl Into<String>>,
        skills: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.skills.is_empty()
    }

    /// Names of the given kind.
    pub fn names(&self, kind: ResourceKind) -> &BTreeSet<String> {
        match kind {
            ResourceKind::Agent => &self.agents,
            ResourceKind::Skill => &self.skills,
        }
    }
}

/// A technology tag describing the project (`language:rust@1.85`).
///
/// Stored verbatim; the sync engine never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackItem {
    pub stack_type: String,
    pub name: String,
    pub version: Option<String>,
}

impl fmt::Display for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.stack_type, self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

impl FromStr for StackItem {
    type Err = String;

    /// Parse `type:name` or `type:name@version`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (stack_type, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("expected `type:name[@version]`, got `{s}`"))?;
        let (name, version) = match rest.split_once('@') {
            Some((name, version)) => (name, Some(version.trim())),
            None => (rest, None),
        };

        let stack_type = stack_type.trim();
        let name = name.trim();
        if stack_type.is_empty() || name.is_empty() {
            return Err(format!("stack type and name must be non-empty in `{s}`"));
        }

        Ok(Self {
            stack_type: stack_type.to_owned(),
            name: name.to_owned(),
            version: version.filter(|v| !v.is_empty()).map(str::to_owned),
        })
    }
}

/// Project-level metadata kept alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub name: Option<String>,
    pub path: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Version of the tool that last committed this ledger.
    pub tool_version: Option<String>,
}
