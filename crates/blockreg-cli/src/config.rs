use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use blockreg_registry::RegistryConfig;
use blockreg_store::LogConfig;

/// Settings for the command-line host, read from an optional TOML file.
///
/// ```toml
/// ledger_path = "data/registry.log"
///
/// [log]
/// sync_mode = "every_write"
///
/// [registry]
/// index_key = "blocksIdCache"
/// index_reload = "per_invocation"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub ledger_path: PathBuf,
    pub log: LogConfig,
    pub registry: RegistryConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("blockreg.log"),
            log: LogConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load from `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply command-line overrides.
    pub fn with_ledger(mut self, ledger: Option<PathBuf>) -> Self {
        if let Some(path) = ledger {
            self.ledger_path = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockreg_registry::IndexReload;
    use blockreg_store::SyncMode;

    #[test]
    fn defaults_without_file() {
        let c = CliConfig::load(None).unwrap();
        assert_eq!(c, CliConfig::default());
        assert_eq!(c.ledger_path, PathBuf::from("blockreg.log"));
    }

    #[test]
    fn load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blockreg.toml");
        std::fs::write(
            &path,
            "ledger_path = \"data/reg.log\"\n\n[log]\nsync_mode = \"os_default\"\n\n[registry]\nindex_reload = \"on_open\"\n",
        )
        .unwrap();

        let c = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(c.ledger_path, PathBuf::from("data/reg.log"));
        assert_eq!(c.log.sync_mode, SyncMode::OsDefault);
        assert_eq!(c.registry.index_reload, IndexReload::OnOpen);
        assert_eq!(c.registry.index_key, "blocksIdCache");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn ledger_override_wins() {
        let c = CliConfig::default().with_ledger(Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(c.ledger_path, PathBuf::from("/tmp/x.log"));
        let c = CliConfig::default().with_ledger(None);
        assert_eq!(c.ledger_path, PathBuf::from("blockreg.log"));
    }
}
