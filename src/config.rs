use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub url: String,
    pub token: String,
    pub mount_path: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8200".to_string(),
            token: String::new(),
            mount_path: "secret".to_string(),
            debug: false,
        }
    }
}

/// Values given on the command line or through `VD_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub mount_path: Option<String>,
    pub debug: bool,
}

impl AppConfig {
    /// Reads `explicit` when given, otherwise the default location. A missing
    /// default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let parsed = toml::from_str::<AppConfig>(&raw)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        Ok(parsed)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(token) = overrides.token {
            self.token = token;
        }
        if let Some(mount_path) = overrides.mount_path {
            self.mount_path = mount_path;
        }
        self.debug |= overrides.debug;
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not resolve config directory")?;
    Ok(base.join("vault-diff").join("config.toml"))
}

pub fn log_path() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("could not resolve cache directory")?;
    Ok(base.join("vault-diff").join("vault-diff.log"))
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
