//! Application configuration management.
//!
//! Holds the backend coordinates (server URL, application id, REST API key)
//! and the last used username. Stored at
//! `~/.config/schoolbook/config.json`; the cache directory is namespaced by
//! application id so two backends never share cached entries.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "schoolbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default Parse server root when the config file does not set one
const DEFAULT_SERVER_URL: &str = "https://parseapi.back4app.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub application_id: String,
    pub rest_api_key: String,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            application_id: String::new(),
            rest_api_key: String::new(),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if !self.application_id.is_empty() {
            path = path.join(&self.application_id);
        }
        Ok(path)
    }

    fn server_root(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// Login endpoint (`GET` with credentials as query parameters)
    pub fn login_url(&self) -> String {
        format!("{}/login", self.server_root())
    }

    /// Query endpoint for a stored class, e.g. `/classes/School`
    pub fn class_url(&self, class_name: &str) -> String {
        format!("{}/classes/{}", self.server_root(), class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let config = Config {
            server_url: "https://api.example.com".to_string(),
            ..Config::default()
        };
        assert_eq!(config.login_url(), "https://api.example.com/login");
        assert_eq!(
            config.class_url("School"),
            "https://api.example.com/classes/School"
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Config {
            server_url: "https://api.example.com/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.login_url(), "https://api.example.com/login");
        assert_eq!(
            config.class_url("Section"),
            "https://api.example.com/classes/Section"
        );
    }
}
