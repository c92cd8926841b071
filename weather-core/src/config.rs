use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::provider::visualcrossing::DEFAULT_BASE_URL;

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "CITYWEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline"
/// data_dir = "/home/me/.local/share/cityweather"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Provider endpoint; the public VisualCrossing timeline API if unset.
    pub base_url: Option<String>,

    /// Directory for the cache and preference files.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// API key for the weather provider.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `cityweather configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Directory for persisted state, falling back to the platform data dir.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Load config from disk (empty default if missing), then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env_override(env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    fn apply_env_override(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "cityweather", "cityweather")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("cityweather configure"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn env_override_replaces_file_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_FILE".into());

        cfg.apply_env_override(Some("FROM_ENV".into()));
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");

        cfg.apply_env_override(Some(String::new()));
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");

        cfg.apply_env_override(None);
        assert_eq!(cfg.api_key().unwrap(), "FROM_ENV");
    }

    #[test]
    fn base_url_defaults_to_visualcrossing() {
        let mut cfg = Config::default();
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);

        cfg.base_url = Some("http://localhost:9000/timeline".into());
        assert_eq!(cfg.base_url(), "http://localhost:9000/timeline");
    }

    #[test]
    fn config_parses_from_toml() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "ABC"
            data_dir = "/tmp/cityweather"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key().unwrap(), "ABC");
        assert_eq!(cfg.data_dir().unwrap(), PathBuf::from("/tmp/cityweather"));
    }
}
