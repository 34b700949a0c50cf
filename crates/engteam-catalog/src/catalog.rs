//! The in-memory catalog of bundled resources.
//!
//! Built once per process by [`crate::scan`]; read-only afterwards. All
//! integrity checks (duplicate names, dangling skill references) run in
//! [`Catalog::from_descriptors`], so every later lookup can trust the
//! agent -> skill edges without re-validating them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::types::{ResourceDescriptor, ResourceKey, ResourceKind};

/// Presentation names for the well-known skill categories.
const CATEGORY_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("languages", "Languages"),
    ("frameworks", "Frameworks"),
    ("databases", "Databases"),
    ("design", "Design & Documentation"),
    ("cloud", "Cloud & Infrastructure"),
    ("product", "Product"),
    ("test-tools", "Test Tools"),
];

/// Human-readable name for a skill category.
///
/// Unknown categories are title-cased word by word (`data-eng` -> `Data-Eng`).
pub fn category_display_name(category: &str) -> String {
    if let Some((_, display)) = CATEGORY_DISPLAY_NAMES.iter().find(|(k, _)| *k == category) {
        return (*display).to_owned();
    }

    let mut out = String::with_capacity(category.len());
    let mut upper = true;
    for c in category.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper = !c.is_alphanumeric();
    }
    out
}

/// Skills grouped under one category, for listings.
#[derive(Debug)]
pub struct SkillCategory<'a> {
    pub name: &'a str,
    pub display_name: String,
    pub skills: Vec<&'a ResourceDescriptor>,
}

/// Validated index of every agent and skill in a bundle.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    agents: BTreeMap<String, ResourceDescriptor>,
    skills: BTreeMap<String, ResourceDescriptor>,
}

impl Catalog {
    /// Index descriptors and check catalog integrity.
    pub fn from_descriptors(
        root: &Path,
        descriptors: impl IntoIterator<Item = ResourceDescriptor>,
    ) -> Result<Self> {
        let mut agents: BTreeMap<String, ResourceDescriptor> = BTreeMap::new();
        let mut skills: BTreeMap<String, ResourceDescriptor> = BTreeMap::new();

        for descriptor in descriptors {
            let index = match descriptor.kind {
                ResourceKind::Agent => &mut agents,
                ResourceKind::Skill => &mut skills,
            };
            if let Some(existing) = index.get(&descriptor.name) {
                return Err(CatalogError::DuplicateName {
                    kind: descriptor.kind,
                    name: descriptor.name.clone(),
                    first: existing.payload.document(),
                    second: descriptor.payload.document(),
                });
            }
            index.insert(descriptor.name.clone(), descriptor);
        }

        for agent in agents.values() {
            if let Some(missing) = agent.dependencies.iter().find(|s| !skills.contains_key(*s)) {
                return Err(CatalogError::DanglingDependency {
                    agent: agent.name.clone(),
                    skill: missing.clone(),
                });
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            agents,
            skills,
        })
    }

    /// The bundle root this catalog was scanned from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lookup(&self, kind: ResourceKind, name: &str) -> Option<&ResourceDescriptor> {
        match kind {
            ResourceKind::Agent => self.agents.get(name),
            ResourceKind::Skill => self.skills.get(name),
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&ResourceDescriptor> {
        self.lookup(key.kind, &key.name)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.get(key).is_some()
    }

    /// Agents in name order.
    pub fn agents(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.agents.values()
    }

    /// Skills in name order.
    pub fn skills(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.skills.values()
    }

    /// Skills grouped by category, categories and skills in name order.
    pub fn categories(&self) -> Vec<SkillCategory<'_>> {
        let mut grouped: BTreeMap<&str, Vec<&ResourceDescriptor>> = BTreeMap::new();
        for skill in self.skills.values() {
            let category = skill.category.as_deref().unwrap_or_default();
            grouped.entry(category).or_default().push(skill);
        }

        grouped
            .into_iter()
            .map(|(name, skills)| SkillCategory {
                name,
                display_name: category_display_name(name),
                skills,
            })
            .collect()
    }

    /// Agents among `agent_names` that require `skill`.
    pub fn dependents_of<'a>(&'a self, skill: &str, agent_names: &[&str]) -> Vec<&'a str> {
        agent_names
            .iter()
            .filter_map(|name| self.agents.get(*name))
            .filter(|agent| agent.dependencies.iter().any(|d| d == skill))
            .map(|agent| agent.name.as_str())
            .collect()
    }

    /// Map each skill required by `agent_names` to the agents that need it.
    pub fn resolve_skill_dependents<'a>(
        &'a self,
        agent_names: &[&str],
    ) -> BTreeMap<&'a str, Vec<&'a str>> {
        let mut deps: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for name in agent_names {
            if let Some(agent) = self.agents.get(*name) {
                for skill in &agent.dependencies {
                    deps.entry(skill.as_str())
                        .or_default()
                        .push(agent.name.as_str());
                }
            }
        }
        deps
    }
}
