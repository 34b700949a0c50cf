//! Import of the JSON project config written by earlier releases.
//!
//! Older releases kept the selection in `<project>/engineering-team.json`
//! with either camelCase or snake_case keys. The file is only read, never
//! rewritten or deleted.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::LedgerResult;
use crate::types::Selection;

/// Legacy config file name.
pub const LEGACY_CONFIG_NAME: &str = "engineering-team.json";

/// Parsed legacy config.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyConfig {
    /// Config format version; written as a string or a number.
    #[serde(default)]
    pub version: Option<serde_json::Value>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, alias = "installedAt")]
    pub installed_at: Option<String>,
    #[serde(default, alias = "cliVersion")]
    pub cli_version: Option<String>,
}

impl LegacyConfig {
    pub fn selection(&self) -> Selection {
        Selection::new(self.agents.iter().cloned(), self.skills.iter().cloned())
    }

    /// `installed_at` as a timestamp, accepting RFC 3339 with or without offset.
    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.installed_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Read the legacy config under `project_root`, if present.
pub fn read_legacy_config(project_root: &Path) -> LedgerResult<Option<LegacyConfig>> {
    let path = project_root.join(LEGACY_CONFIG_NAME);
    if !path.is_file() {
        debug!(path = %path.display(), "no legacy config");
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)?;
    let config: LegacyConfig = serde_json::from_str(&content)?;
    info!(
        path = %path.display(),
        agents = config.agents.len(),
        skills = config.skills.len(),
        "read legacy project config"
    );
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_CONFIG_NAME),
            r#"{
                "version": "1.0",
                "agents": ["backend-engineer"],
                "skills": ["rust"],
                "installedAt": "2024-05-01T10:00:00Z",
                "cliVersion": "0.2.1"
            }"#,
        )
        .unwrap();

        let config = read_legacy_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.cli_version.as_deref(), Some("0.2.1"));
        assert_eq!(
            config.selection(),
            Selection::new(["backend-engineer"], ["rust"])
        );
        assert_eq!(
            config.installed_at().unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn reads_snake_case_keys_with_naive_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LEGACY_CONFIG_NAME),
            r#"{"agents": [], "installed_at": "2024-05-01T10:00:00.123456", "cli_version": "0.1.0"}"#,
        )
        .unwrap();

        let config = read_legacy_config(dir.path()).unwrap().unwrap();
        assert!(config.selection().is_empty());
        assert!(config.installed_at().is_some());
        assert_eq!(config.cli_version.as_deref(), Some("0.1.0"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_legacy_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LEGACY_CONFIG_NAME), "{ not json").unwrap();
        assert!(read_legacy_config(dir.path()).is_err());
    }
}
