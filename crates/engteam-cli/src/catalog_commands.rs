//! `list`: print what the bundle provides.

use anyhow::Result;
use engteam_catalog::Catalog;
use serde_json::{Value, json};

/// Which partitions to print.
#[derive(Debug, Clone, Copy)]
pub struct ListFilter {
    pub agents: bool,
    pub skills: bool,
}

impl ListFilter {
    /// `--agents` / `--skills`; neither flag means both.
    pub fn from_flags(agents: bool, skills: bool) -> Self {
        if agents || skills {
            Self { agents, skills }
        } else {
            Self {
                agents: true,
                skills: true,
            }
        }
    }
}

pub fn cmd_list(catalog: &Catalog, filter: ListFilter, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&catalog_json(catalog, filter))?);
        return Ok(());
    }

    if filter.agents {
        println!();
        println!("  Agents");
        println!("  ======");
        for agent in catalog.agents() {
            println!("  {:<28} {}", agent.name, agent.description);
            if !agent.dependencies.is_empty() {
                println!("  {:<28}   skills: {}", "", agent.dependencies.join(", "));
            }
        }
    }

    if filter.skills {
        for category in catalog.categories() {
            println!();
            println!("  {}", category.display_name);
            println!("  {}", "=".repeat(category.display_name.len()));
            for skill in category.skills {
                println!("  {:<28} {}", skill.name, skill.description);
            }
        }
    }
    println!();
    Ok(())
}

fn catalog_json(catalog: &Catalog, filter: ListFilter) -> Value {
    let mut out = serde_json::Map::new();

    if filter.agents {
        let agents: Vec<Value> = catalog
            .agents()
            .map(|a| {
                json!({
                    "name": a.name,
                    "description": a.description,
                    "skills": a.dependencies,
                    "model": a.model,
                    "tools": a.tools,
                })
            })
            .collect();
        out.insert("agents".into(), Value::Array(agents));
    }

    if filter.skills {
        let categories: Vec<Value> = catalog
            .categories()
            .into_iter()
            .map(|c| {
                let skills: Vec<Value> = c
                    .skills
                    .iter()
                    .map(|s| {
                        json!({
                            "name": s.name,
                            "description": s.description,
                            "has_references": s.has_references(),
                            "has_assets": s.has_assets(),
                        })
                    })
                    .collect();
                json!({
                    "category": c.name,
                    "display_name": c.display_name,
                    "skills": skills,
                })
            })
            .collect();
        out.insert("skills".into(), Value::Array(categories));
    }

    Value::Object(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn catalog(root: &Path) -> Catalog {
        write(
            &root.join("agents/backend.md"),
            "---\nname: backend\ndescription: Backend engineer\nskills: postgres\nmodel: sonnet\n---\n",
        );
        write(
            &root.join("skills/databases/postgres/SKILL.md"),
            "---\nname: postgres\ndescription: PostgreSQL\n---\n",
        );
        write(&root.join("skills/databases/postgres/assets/schema.sql"), "--");
        engteam_catalog::scan(root).unwrap()
    }

    #[test]
    fn no_flags_means_both() {
        let f = ListFilter::from_flags(false, false);
        assert!(f.agents && f.skills);
        let f = ListFilter::from_flags(true, false);
        assert!(f.agents && !f.skills);
    }

    #[test]
    fn json_lists_agents_and_grouped_skills() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path());

        let value = catalog_json(&catalog, ListFilter::from_flags(false, false));
        assert_eq!(value["agents"][0]["name"], "backend");
        assert_eq!(value["agents"][0]["skills"][0], "postgres");
        assert_eq!(value["agents"][0]["model"], "sonnet");
        assert_eq!(value["skills"][0]["display_name"], "Databases");
        assert_eq!(value["skills"][0]["skills"][0]["has_assets"], true);
        assert_eq!(value["skills"][0]["skills"][0]["has_references"], false);
    }

    #[test]
    fn json_respects_filter() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path());

        let value = catalog_json(&catalog, ListFilter::from_flags(false, true));
        assert!(value.get("agents").is_none());
        assert!(value.get("skills").is_some());
    }
}
