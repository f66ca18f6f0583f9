//! # System Configuration
//!
//! Locates and parses `config/kamexport.toml` under the configuration root.
//!
//! The root comes from `KAMEXPORT_HOME`, falling back to `CMD_HOME`.
//! Environment lookup is passed in as a closure, so the resolved value is
//! threaded explicitly through the command rather than read globally.
//!
//! ```toml
//! [kam_store]
//! url = "redb://data/kams.redb"
//! user = "kam"
//! password = "secret"
//! ```

use kamexport_core::KamError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Primary environment variable naming the configuration root.
pub const HOME_ENV: &str = "KAMEXPORT_HOME";

/// Fallback environment variable naming the configuration root.
pub const FALLBACK_HOME_ENV: &str = "CMD_HOME";

/// Location of the configuration file relative to the root.
pub const CONFIG_FILE: &str = "config/kamexport.toml";

const REDB_SCHEME: &str = "redb://";

/// KAM store connection settings.
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    kam_store: StoreConfig,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct SystemConfiguration {
    /// Configuration root; relative store paths resolve against it.
    pub root: PathBuf,
    pub store: StoreConfig,
}

impl SystemConfiguration {
    /// Resolve the configuration root from the environment and load its file.
    pub fn resolve<F>(env: F) -> Result<Self, KamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        let root = set(HOME_ENV)
            .or_else(|| set(FALLBACK_HOME_ENV))
            .ok_or_else(|| KamError::ConfigurationError("CMD_HOME needs to be set.".into()))?;
        Self::load(Path::new(&root))
    }

    /// Load `config/kamexport.toml` from `root`.
    pub fn load(root: &Path) -> Result<Self, KamError> {
        let path = root.join(CONFIG_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            KamError::ConfigurationError(format!(
                "Cannot read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|e| {
            KamError::ConfigurationError(format!(
                "Invalid configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;
        if file.kam_store.url.trim().is_empty() {
            return Err(KamError::ConfigurationError(
                "kam_store.url is not set.".to_string(),
            ));
        }

        Ok(Self {
            root: root.to_path_buf(),
            store: file.kam_store,
        })
    }

    /// Filesystem path of the redb store named by the store URL.
    pub fn database_path(&self) -> Result<PathBuf, KamError> {
        let url = self.store.url.trim();
        let raw = match url.strip_prefix(REDB_SCHEME) {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(KamError::ConfigurationError(format!(
                    "Unsupported KAM store URL '{}'",
                    url
                )));
            }
            None => url,
        };
        let path = Path::new(raw);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        })
    }
}
