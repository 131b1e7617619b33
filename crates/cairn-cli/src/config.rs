//! Cairn user configuration stored at `~/.cairn.yaml`.
//!
//! The file supplies defaults for global flags. Resolution order (highest
//! priority first):
//! 1. Explicit flag (`--state`, `--name`)
//! 2. Environment (`CAIRN_STATE_STORE`, handled by clap)
//! 3. The config file
//!
//! ```yaml
//! state: file:///var/lib/cairn
//! name: dev.example.com
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const CONFIG_FILE_NAME: &str = ".cairn.yaml";

/// Defaults read from the user config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// State store URI.
    #[serde(default)]
    pub state: Option<String>,
    /// Default cluster name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A config and the file it came from, if any.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: CliConfig,
    pub path: Option<PathBuf>,
}

/// Path to `~/.cairn.yaml`, `None` if the home directory is unknown.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Load the user config.
///
/// An explicit path must exist. The default path is optional; a missing
/// file yields an empty config.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => read_config(path),
        None => match default_config_path() {
            Some(path) if path.is_file() => read_config(&path),
            _ => Ok(LoadedConfig::default()),
        },
    }
}

fn read_config(path: &Path) -> Result<LoadedConfig> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::read_file(path, e))?;
    let config = if data.trim().is_empty() {
        CliConfig::default()
    } else {
        serde_yaml::from_str(&data).map_err(|e| {
            Error::command_failed(format!("failed to parse {}: {}", path.display(), e))
        })?
    };
    Ok(LoadedConfig {
        config,
        path: Some(path.to_path_buf()),
    })
}

impl CliConfig {
    /// State store URI, preferring the flag/env value.
    pub fn resolve_state(&self, flag: Option<&str>) -> Option<String> {
        non_empty(flag).or_else(|| non_empty(self.state.as_deref()))
    }

    /// Cluster name, preferring the flag value.
    pub fn resolve_name(&self, flag: Option<&str>) -> Option<String> {
        non_empty(flag).or_else(|| non_empty(self.name.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "state: file:///srv/cairn\nname: dev.example.com").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.state.as_deref(), Some("file:///srv/cairn"));
        assert_eq!(loaded.config.name.as_deref(), Some("dev.example.com"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn empty_config_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config, CliConfig::default());
    }

    #[test]
    fn malformed_config_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "state: [unterminated").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn flags_win_over_config_file() {
        let config = CliConfig {
            state: Some("file:///from/config".to_string()),
            name: Some("config.example.com".to_string()),
        };
        assert_eq!(
            config.resolve_state(Some("memory://")).as_deref(),
            Some("memory://")
        );
        assert_eq!(
            config.resolve_name(None).as_deref(),
            Some("config.example.com")
        );
        assert_eq!(
            config.resolve_name(Some("")).as_deref(),
            Some("config.example.com")
        );
        assert_eq!(CliConfig::default().resolve_state(None), None);
    }
}
