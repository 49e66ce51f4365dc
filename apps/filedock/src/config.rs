//! Filedock configuration.
//!
//! Stored as TOML at `$XDG_CONFIG_HOME/filedock/filedock.toml`
//! (`~/.config/filedock/filedock.toml` when unset).

use std::path::{Path, PathBuf};
use std::time::Duration;

use filedock_offline_cache::RouterConfig;
use serde::{Deserialize, Serialize};

/// Filedock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiledockConfig {
    /// Base URL of the backend API, e.g. `https://files.example/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Origin the web application is served from.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// Origin of the object-storage host.
    #[serde(default = "default_storage_origin")]
    pub storage_origin: String,

    /// Static bearer token; empty means unauthenticated.
    #[serde(default)]
    pub auth_token: String,

    /// Root of the offline cache. Empty uses the platform cache directory.
    #[serde(default)]
    pub cache_dir: String,

    #[serde(default = "default_listing_timeout_secs")]
    pub listing_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".into()
}

fn default_app_origin() -> String {
    "http://localhost:8080".into()
}

fn default_storage_origin() -> String {
    "http://localhost:10000".into()
}

fn default_listing_timeout_secs() -> u64 {
    3
}

impl Default for FiledockConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            app_origin: default_app_origin(),
            storage_origin: default_storage_origin(),
            auth_token: String::new(),
            cache_dir: String::new(),
            listing_timeout_secs: default_listing_timeout_secs(),
        }
    }
}

impl FiledockConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // May contain the auth token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn auth_token(&self) -> Option<&str> {
        Some(self.auth_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn cache_root(&self) -> PathBuf {
        if self.cache_dir.is_empty() {
            default_cache_dir()
        } else {
            PathBuf::from(&self.cache_dir)
        }
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig::new(&self.app_origin, &self.storage_origin)
            .with_listing_timeout(Duration::from_secs(self.listing_timeout_secs))
    }
}

fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
        .join("filedock")
        .join("filedock.toml")
}

fn default_cache_dir() -> PathBuf {
    xdg_dir("XDG_CACHE_HOME", ".cache").join("filedock")
}

fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(fallback)
        })
}
