//! Per-project settings.
//!
//! Read from `engineering-team.toml` in the project root. Every field has a
//! default, so a missing file or a partial one is fine; a file that does
//! not parse is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings file name, relative to the project root.
pub const SETTINGS_FILE_NAME: &str = "engineering-team.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Bundle root. Relative paths are taken from the project root.
    pub bundle: Option<PathBuf>,
    /// Log level used when neither `RUST_LOG` nor `-v` is given.
    pub log_level: String,
    pub sync: SyncSettings,
}

/// The `[sync]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub prune: bool,
    pub skip_unchanged: bool,
    pub lock_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bundle: None,
            log_level: "warn".to_string(),
            sync: SyncSettings::default(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            prune: false,
            skip_unchanged: false,
            lock_timeout_ms: engteam_ledger::DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl SyncSettings {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Settings {
    /// Configured bundle root, resolved against `project_root`.
    pub fn bundle_root(&self, project_root: &Path) -> Option<PathBuf> {
        self.bundle.as_ref().map(|p| project_root.join(p))
    }
}

/// Load `<project_root>/engineering-team.toml`, or defaults when absent.
pub fn load_settings(project_root: &Path) -> Result<Settings> {
    let path = project_root.join(SETTINGS_FILE_NAME);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    parse_settings(&content).with_context(|| format!("invalid settings in {}", path.display()))
}

fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sync.lock_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = parse_settings(
            r#"
            bundle = "vendor/engineering-team"

            [sync]
            prune = true
            "#,
        )
        .unwrap();
        assert!(settings.sync.prune);
        assert!(!settings.sync.skip_unchanged);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(
            settings.bundle_root(Path::new("/work/app")),
            Some(PathBuf::from("/work/app/vendor/engineering-team"))
        );
    }

    #[test]
    fn absolute_bundle_is_kept() {
        let settings = parse_settings(r#"bundle = "/opt/bundle""#).unwrap();
        assert_eq!(
            settings.bundle_root(Path::new("/work/app")),
            Some(PathBuf::from("/opt/bundle"))
        );
    }

    #[test]
    fn unknown_keys_and_bad_types_are_rejected() {
        assert!(parse_settings("colour = true").is_err());
        assert!(parse_settings("[sync]\nprune = \"yes\"").is_err());
    }

    #[test]
    fn missing_file_is_default_and_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(dir.path()).unwrap(), Settings::default());

        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), "log_level = [").unwrap();
        let err = load_settings(dir.path()).unwrap_err();
        assert!(err.to_string().contains("invalid settings"));
    }
}
