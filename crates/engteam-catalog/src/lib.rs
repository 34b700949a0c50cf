//! # engteam-catalog
//!
//! Read-only index of the agents and skills shipped in an engineering-team
//! bundle.
//!
//! A bundle has two partitions:
//!
//! - **agents** are single markdown documents whose header names the skills
//!   they require.
//! - **skills** are directories grouped by category, each holding a
//!   `SKILL.md` plus optional `references/` and `assets/` subtrees.
//!
//! [`scan`] parses every header, checks catalog integrity (required fields,
//! duplicate names, dangling skill references) and returns a [`Catalog`].
//! Nothing is written to disk.
//!
//! ```rust,no_run
//! use engteam_catalog::{ResourceKind, scan};
//! use std::path::Path;
//!
//! let catalog = scan(Path::new("data")).unwrap();
//! if let Some(agent) = catalog.lookup(ResourceKind::Agent, "backend-engineer") {
//!     println!("{} needs {:?}", agent.name, agent.dependencies);
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod parser;
pub mod scan;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use catalog::{Catalog, SkillCategory, category_display_name};
pub use error::{CatalogError, Result};
pub use parser::{Header, parse_header};
pub use scan::scan;
pub use types::{
    DOC_EXTENSION, Payload, ResourceDescriptor, ResourceKey, ResourceKind, SKILL_DOCUMENT,
    SKILL_SUBTREES,
};
