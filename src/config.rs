//! Configuration for the rekor command-line client
//!
//! Sources, lowest precedence first:
//! - Default values
//! - `$HOME/.rekor.toml`
//! - An explicit config file (`--config`)
//! - Environment variables (`REKOR_*`)
//!
//! Command-line flags are applied on top by the binary.
//!
//! ## Example config file (.rekor.toml):
//! ```toml
//! log_rpc_server = "localhost:8091"
//! tlog_id = 1234
//! linkfile = "./build.link"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-user config file in the home directory
pub const CONFIG_FILE_NAME: &str = ".rekor.toml";

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekorConfig {
    /// Log service address (host:port)
    #[serde(default = "default_log_rpc_server")]
    pub log_rpc_server: String,

    /// Numeric identifier of the transparency log
    #[serde(default)]
    pub tlog_id: i64,

    /// In-toto link file to submit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkfile: Option<PathBuf>,
}

fn default_log_rpc_server() -> String {
    "localhost:8091".to_string()
}

impl Default for RekorConfig {
    fn default() -> Self {
        Self {
            log_rpc_server: default_log_rpc_server(),
            tlog_id: 0,
            linkfile: None,
        }
    }
}

/// Location of the per-user config file, if a home directory is known
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILE_NAME))
}

impl RekorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` replacing the home config file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match config_path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                if let Some(home_config) = default_config_path() {
                    builder = builder.add_source(File::from(home_config).required(false));
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("REKOR").try_parsing(true));

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        if let Some(path) = config_path {
            tracing::info!(path = %path.display(), "using config file");
        }
        Ok(loaded)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
