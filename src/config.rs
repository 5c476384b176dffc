//! Engine configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings shared by the library entry points and the CLI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graph name used to key schema entries.
    pub graph_name: String,
    /// Node rows reserved when a graph is opened.
    pub initial_node_capacity: usize,
    /// Installs counting storage metrics when set.
    pub collect_metrics: bool,
    /// `tracing` filter directive used by the CLI.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            graph_name: "default".to_owned(),
            initial_node_capacity: 64,
            collect_metrics: false,
            log_filter: "matrixgraph=info".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from `explicit`, or from the per-user default
    /// location; a missing file yields the defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit.or_else(default_config_path) {
            Some(path) if path.exists() => read_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })
    }

    /// Writes the configuration to `path`, or to the default location.
    pub fn persist(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path().ok_or(ConfigError::NoConfigPath)?,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, self.to_toml()?).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

fn read_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors raised while loading or writing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File is not valid TOML for [`EngineConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// Configuration could not be rendered.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// Underlying error.
        source: toml::ser::Error,
    },
    /// Parent directory could not be created.
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        /// Directory.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File could not be written.
    #[error("failed to write config {path}: {source}")]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// No explicit path and no per-user config directory.
    #[error("unable to determine config path")]
    NoConfigPath,
}

/// Default per-user configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("matrixgraph").join("config.toml"))
}
