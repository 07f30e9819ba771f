use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Tunables read from `config.toml`. Every key is optional; command-line
/// flags override whatever is set here. The access token is never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_version: String,
    pub page_size: u32,
    pub focus_days: u32,
    pub focus_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_version: "v2.5".to_string(),
            page_size: 4000,
            focus_days: 15,
            focus_interval: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    config_file: PathBuf,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "the-eye").context("Failed to get project directories")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        let config_file = config_dir.join("config.toml");

        Ok(AppConfig { config_file })
    }

    pub fn load(&self) -> Result<Option<Config>> {
        if !self.config_file.exists() {
            return Ok(None);
        }

        let contents =
            fs::read_to_string(&self.config_file).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(Some(config))
    }
}
