use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the user commands act on behalf of; empty until someone logs in
    #[serde(default)]
    pub current_user_name: String,
    pub db_url: String,
}

impl Config {
    /// `<home>/.gatorconfig.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = BaseDirs::new().ok_or(ConfigError::HomeNotFound)?;
        Ok(dirs.home_dir().join(CONFIG_FILE_NAME))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse config from a JSON string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Rewrites the whole file. The document goes to a sibling temp file
    /// first and is renamed over `path`, so readers never see a torn write.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        debug!("Wrote config to {}", path.display());
        Ok(())
    }

    pub fn set_user<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<(), ConfigError> {
        let next = Config {
            current_user_name: name.to_string(),
            ..self.clone()
        };
        next.save(path)?;
        *self = next;
        Ok(())
    }
}
