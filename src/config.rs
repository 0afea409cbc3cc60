use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::scroll::DEFAULT_THRESHOLD_PX;

pub const URL_ENV: &str = "GLOWLIST_URL";
pub const API_KEY_ENV: &str = "GLOWLIST_API_KEY";

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("glowlist")
        .join("config.json")
}

fn default_preferences_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("glowlist")
        .join("preferences.json")
}

fn default_scroll_threshold() -> f64 {
    DEFAULT_THRESHOLD_PX
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the hosted table service lives.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold_px: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            preferences_path: default_preferences_path(),
            debug_logging: false,
            scroll_threshold_px: DEFAULT_THRESHOLD_PX,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        default_config_path()
    }

    /// Reads the config at `path`, falling back to defaults when the file is
    /// missing or unreadable, then applies environment overrides.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.url = url.trim().to_string();
        }
        if let Some(key) = var(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.api_key = key.trim().to_string();
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// True once both the service URL and key are set.
    pub fn backend_ready(&self) -> bool {
        !self.backend.url.trim().is_empty() && !self.backend.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: AppConfig = serde_json::from_str("{}").unwrap();
        config.apply_env(|_| None);
        assert_eq!(config.scroll_threshold_px, DEFAULT_THRESHOLD_PX);
        assert!(!config.backend_ready());

        let loaded = AppConfig::load(&dir.path().join("absent.json"));
        assert!(!loaded.debug_logging);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glowlist").join("config.json");
        let config = AppConfig {
            backend: BackendConfig {
                url: "https://db.example.com".to_string(),
                api_key: "anon".to_string(),
            },
            preferences_path: dir.path().join("prefs.json"),
            debug_logging: true,
            scroll_threshold_px: 24.0,
        };
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let reread: AppConfig = serde_json::from_str(&content).unwrap();
        assert_eq!(reread, config);
        assert!(reread.backend_ready());
    }

    #[test]
    fn environment_overrides_backend() {
        let mut config = AppConfig::default();
        config.backend.url = "https://old.example.com".to_string();
        config.apply_env(|key| match key {
            URL_ENV => Some(" https://new.example.com ".to_string()),
            API_KEY_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.backend.url, "https://new.example.com");
        assert!(config.backend.api_key.is_empty());
    }
}
