//! `thalo.toml` / `.thalorc` workspace configuration: rule severity
//! overrides, `max_warnings`, included globs, and the default change-tracker
//! strategy. Discovery walks up from the working directory to the first
//! config file found, so a subdirectory invocation still picks up the
//! workspace-root config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thalo_checker::{CheckerConfig, SeverityOverride};

const CONFIG_NAMES: [&str; 2] = ["thalo.toml", ".thalorc"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
    #[serde(default)]
    pub max_warnings: Option<usize>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub tracker: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("unknown severity \"{0}\" for rule \"{1}\" (expected off|error|warning|info)")]
    UnknownSeverity(String, String),
}

impl FileConfig {
    /// Walks up from `start` looking for `thalo.toml` or `.thalorc`. Returns
    /// `Ok(None)` if neither exists anywhere up to the filesystem root.
    pub fn discover(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let mut dir = Some(start.to_path_buf());
        while let Some(current) = dir {
            for name in CONFIG_NAMES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    let config = Self::load(&candidate)?;
                    return Ok(Some((candidate, config)));
                }
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        Ok(None)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn into_checker_config(self) -> Result<CheckerConfig, ConfigError> {
        let mut rule_overrides = rustc_hash::FxHashMap::default();
        for (code, severity) in &self.rules {
            let parsed = SeverityOverride::parse(severity).ok_or_else(|| ConfigError::UnknownSeverity(severity.clone(), code.clone()))?;
            rule_overrides.insert(code.clone(), parsed);
        }
        Ok(CheckerConfig { rule_overrides, max_warnings: self.max_warnings })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn parses_rule_overrides_and_max_warnings() {
        let config: FileConfig = toml::from_str(
            "max_warnings = 5\n\n[rules]\nunknown-entity = \"off\"\nunresolved-link = \"error\"\n",
        )
        .unwrap();
        assert_eq!(config.max_warnings, Some(5));
        let checker_config = config.into_checker_config().unwrap();
        assert_eq!(checker_config.max_warnings, Some(5));
        assert!(matches!(checker_config.rule_overrides.get("unknown-entity"), Some(SeverityOverride::Off)));
        assert!(matches!(checker_config.rule_overrides.get("unresolved-link"), Some(SeverityOverride::Error)));
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let config: FileConfig = toml::from_str("[rules]\nunknown-entity = \"maybe\"\n").unwrap();
        assert!(config.into_checker_config().is_err());
    }

    #[test]
    fn discover_walks_up_to_the_first_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("thalo.toml"), "max_warnings = 0\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let (found, config) = FileConfig::discover(&nested).unwrap().expect("config found");
        assert_eq!(found, dir.path().join("thalo.toml"));
        assert_eq!(config.max_warnings, Some(0));
    }

    #[test]
    fn discover_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::discover(dir.path()).unwrap().is_none());
    }
}
