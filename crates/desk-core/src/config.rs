use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project-level configuration, read from `.desk/config.toml`.
///
/// Every field has a default so a missing or empty file behaves the same
/// as no file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub actor: ActorConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Who acts when the caller does not say.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// User id assumed by the CLI when `--as` is omitted.
    #[serde(default)]
    pub default: Option<String>,
}

/// Reporting knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Trailing window for the recent-volume KPI, in days.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

const fn default_window_days() -> i64 {
    7
}

impl ProjectConfig {
    /// Load config from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectConfig;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = ProjectConfig::load(&dir.path().join("config.toml")).expect("load");
        assert!(config.actor.default.is_none());
        assert_eq!(config.report.window_days, 7);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[actor]\ndefault = \"usr-12ab34cd\"\n").expect("write");

        let config = ProjectConfig::load(&path).expect("load");
        assert_eq!(config.actor.default.as_deref(), Some("usr-12ab34cd"));
        assert_eq!(config.report.window_days, 7);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "actor = [nope").expect("write");
        assert!(ProjectConfig::load(&path).is_err());
    }
}
