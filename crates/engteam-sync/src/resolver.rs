//! Dependency resolver: expands requested agents into the skills they need.
//!
//! The agent -> skill relation is exactly two levels deep and was checked
//! when the catalog was scanned, so resolution is one pass with no cycle
//! handling.

use std::collections::{BTreeMap, BTreeSet};

use engteam_catalog::{Catalog, ResourceDescriptor, ResourceKey, ResourceKind};
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// The desired set for one sync: requested names plus their dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSet {
    pub agents: BTreeSet<String>,
    pub skills: BTreeSet<String>,
}

impl ResolvedSet {
    /// Every member as a resource key, agents first.
    pub fn keys(&self) -> BTreeSet<ResourceKey> {
        self.agents
            .iter()
            .map(ResourceKey::agent)
            .chain(self.skills.iter().map(ResourceKey::skill))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len() + self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty() && self.skills.is_empty()
    }
}

/// Resolve requested agent and skill names against `catalog`.
///
/// Fails with [`SyncError::UnknownResource`] on the first name the catalog
/// does not know.
pub fn resolve<A, S>(catalog: &Catalog, agents: A, skills: S) -> SyncResult<ResolvedSet>
where
    A: IntoIterator,
    A::Item: AsRef<str>,
    S: IntoIterator,
    S::Item: AsRef<str>,
{
    let mut resolved = ResolvedSet::default();

    for name in skills {
        let name = name.as_ref();
        require(catalog, ResourceKind::Skill, name)?;
        resolved.skills.insert(name.to_owned());
    }

    for name in agents {
        let name = name.as_ref();
        let agent = require(catalog, ResourceKind::Agent, name)?;
        resolved.agents.insert(name.to_owned());
        resolved.skills.extend(agent.dependencies.iter().cloned());
    }

    debug!(
        agents = resolved.agents.len(),
        skills = resolved.skills.len(),
        "resolved desired set"
    );
    Ok(resolved)
}

/// Skills pulled in by `agents` that were not requested directly, each with
/// the agents that need it.
pub fn auto_added_skills<'a>(
    catalog: &'a Catalog,
    resolved: &ResolvedSet,
    requested_skills: &BTreeSet<String>,
) -> BTreeMap<&'a str, Vec<&'a str>> {
    let agents: Vec<&str> = resolved.agents.iter().map(String::as_str).collect();
    let mut deps = catalog.resolve_skill_dependents(&agents);
    deps.retain(|skill, _| !requested_skills.contains(*skill));
    deps
}

fn require<'a>(
    catalog: &'a Catalog,
    kind: ResourceKind,
    name: &str,
) -> SyncResult<&'a ResourceDescriptor> {
    catalog
        .lookup(kind, name)
        .ok_or_else(|| SyncError::UnknownResource {
            kind,
            name: name.to_owned(),
        })
}
