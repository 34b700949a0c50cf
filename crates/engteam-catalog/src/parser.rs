//! Header block parser for agent and skill documents.
//!
//! Every primary document starts with a YAML-style header fenced by `---`
//! lines, followed by the markdown body:
//!
//! ```text
//! ---
//! name: backend-engineer
//! description: Designs and implements server-side features.
//! model: sonnet
//! tools: Read, Edit, Bash
//! skills:
//!   - rust
//!   - postgres
//! ---
//!
//! # Backend Engineer
//! ...
//! ```
//!
//! The parser only extracts fields; required-field validation happens in
//! the descriptor constructors in [`crate::types`].

use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{CatalogError, Result};

/// Fields extracted from a document header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Required skills; accepts a block list, a flow list, or a comma-separated string.
    pub skills: Vec<String>,
    pub model: Option<String>,
    pub tools: Option<String>,
}

/// Header as deserialized from YAML, before normalization.
#[derive(Debug, Default, Deserialize)]
struct RawHeader {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    skills: Option<Value>,
    #[serde(default)]
    model: Option<Value>,
    #[serde(default)]
    tools: Option<Value>,
}

/// Split a document into its header text and markdown body.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    if !content.starts_with("---") {
        return None;
    }

    let after_first = &content[3..];
    let end = after_first.find("\n---")?;
    let yaml = after_first[..end].trim_matches(['\n', '\r']);
    let body = after_first[end + 4..].trim_start_matches(['\n', '\r']);

    Some((yaml, body))
}

/// Parse the header block of a document.
pub fn parse_header(content: &str, source_path: &Path) -> Result<Header> {
    let (yaml_str, _body) = split_header(content).ok_or_else(|| CatalogError::MissingHeader {
        path: source_path.to_path_buf(),
    })?;

    // An empty block is a header with no fields, not a YAML error.
    let raw: RawHeader = if yaml_str.trim().is_empty() {
        RawHeader::default()
    } else {
        serde_yaml::from_str(yaml_str).map_err(|e| CatalogError::InvalidHeader {
            path: source_path.to_path_buf(),
            reason: e.to_string(),
        })?
    };

    let invalid = |field: &str| CatalogError::InvalidHeader {
        path: source_path.to_path_buf(),
        reason: format!("field `{field}` must be a string"),
    };

    let skills = match raw.skills {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => split_list(&s),
        Some(Value::Sequence(items)) => items
            .into_iter()
            .map(|item| scalar(item).ok_or_else(|| invalid("skills")))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect(),
        Some(_) => return Err(invalid("skills")),
    };

    let tools = match raw.tools {
        Some(Value::Sequence(items)) => Some(
            items
                .into_iter()
                .filter_map(scalar)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => optional_scalar(other).map_err(|()| invalid("tools"))?,
    };

    Ok(Header {
        name: optional_scalar(raw.name).map_err(|()| invalid("name"))?,
        description: optional_scalar(raw.description).map_err(|()| invalid("description"))?,
        skills,
        model: optional_scalar(raw.model).map_err(|()| invalid("model"))?,
        tools,
    })
}

fn optional_scalar(value: Option<Value>) -> std::result::Result<Option<String>, ()> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar(v).map(Some).ok_or(()),
    }
}

fn scalar(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_agent_header_with_block_list() {
        let content = r#"---
name: backend-engineer
description: Designs and implements server-side features.
model: sonnet
tools: Read, Edit, Bash
skills:
  - rust
  - postgres
---

# Backend Engineer

Body text.
"#;
        let header = parse_header(content, Path::new("agents/backend-engineer.md")).unwrap();
        assert_eq!(header.name.as_deref(), Some("backend-engineer"));
        assert_eq!(header.model.as_deref(), Some("sonnet"));
        assert_eq!(header.tools.as_deref(), Some("Read, Edit, Bash"));
        assert_eq!(header.skills, vec!["rust", "postgres"]);
    }

    #[test]
    fn skills_accepts_flow_list_and_comma_string() {
        let flow = "---\nname: a\ndescription: b\nskills: [rust, \"go\"]\n---\n";
        let header = parse_header(flow, Path::new("a.md")).unwrap();
        assert_eq!(header.skills, vec!["rust", "go"]);

        let csv = "---\nname: a\ndescription: b\nskills: rust, go ,\n---\n";
        let header = parse_header(csv, Path::new("a.md")).unwrap();
        assert_eq!(header.skills, vec!["rust", "go"]);
    }

    #[test]
    fn tools_list_is_joined() {
        let content = "---\nname: a\ndescription: b\ntools:\n  - Read\n  - Write\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.tools.as_deref(), Some("Read, Write"));
    }

    #[test]
    fn folded_description_is_joined() {
        let content = "---\nname: a\ndescription: >\n  first line\n  second line\nmodel: opus\n---\nbody";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.description.as_deref(), Some("first line second line"));
        assert_eq!(header.model.as_deref(), Some("opus"));
    }

    #[test]
    fn literal_description_keeps_newlines() {
        let content = "---\nname: a\ndescription: |\n  one\n  two\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.description.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn quoted_description_may_contain_colons() {
        let content = "---\nname: a\ndescription: \"Use when: the API breaks\"\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.description.as_deref(), Some("Use when: the API breaks"));
    }

    #[test]
    fn trailing_comments_are_not_part_of_values() {
        let content = "---\n\
            # backend agent header\n\
            name: backend # the backend agent\n\
            description: Builds services\n\
            skills:\n  \
              - python # primary language\n  \
              - postgres\n\
            ---\n";
        let header = parse_header(content, Path::new("agents/backend.md")).unwrap();
        assert_eq!(header.name.as_deref(), Some("backend"));
        assert_eq!(header.skills, vec!["python", "postgres"]);
    }

    #[test]
    fn quoted_scalars_follow_yaml_rules() {
        let content = "---\nname: a\ndescription: \"Tabs\\tand \\\"quotes\\\"\"\nskills: [\"x, y\", z]\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.description.as_deref(), Some("Tabs\tand \"quotes\""));
        assert_eq!(header.skills, vec!["x, y", "z"]);
    }

    #[test]
    fn malformed_yaml_is_invalid_header() {
        let content = "---\nname: a\ndescription: [unclosed\n---\n";
        let err = parse_header(content, Path::new("a.md")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidHeader { .. }));
    }

    #[test]
    fn empty_header_has_no_fields() {
        let header = parse_header("---\n---\nbody", Path::new("a.md")).unwrap();
        assert_eq!(header, Header::default());
    }

    #[test]
    fn missing_header_fails() {
        let err = parse_header("# Just markdown", Path::new("a.md")).unwrap_err();
        assert!(matches!(err, CatalogError::MissingHeader { .. }));
    }

    #[test]
    fn unterminated_header_fails() {
        let err = parse_header("---\nname: a\n", Path::new("a.md")).unwrap_err();
        assert!(matches!(err, CatalogError::MissingHeader { .. }));
    }

    #[test]
    fn nested_map_for_string_field_is_invalid() {
        let content = "---\nname:\n  first: a\ndescription: b\n---\n";
        let err = parse_header(content, Path::new("a.md")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidHeader { .. }));
    }

    #[test]
    fn numeric_name_is_kept_as_text() {
        let content = "---\nname: 2048\ndescription: game\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.name.as_deref(), Some("2048"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let content = "---\nname: a\ndescription: b\ncolor: blue\nmetadata:\n  owner: team\n---\n";
        let header = parse_header(content, Path::new("a.md")).unwrap();
        assert_eq!(header.name.as_deref(), Some("a"));
    }

    #[test]
    fn split_header_works() {
        let (yaml, body) = split_header("---\nfoo: bar\n---\nbody here").unwrap();
        assert_eq!(yaml, "foo: bar");
        assert_eq!(body, "body here");
    }
}
