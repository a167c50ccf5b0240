//! Tool settings.
//!
//! Optional TOML file read by the binary. Every field has a default, and
//! command-line flags override what the file says.
//!
//! ```toml
//! template = "/etc/boggart/template.yaml"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::LoggingConfig;

/// Root settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Template used when none is given on the command line.
    pub template: Option<PathBuf>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
