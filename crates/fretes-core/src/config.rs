use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Runtime configuration, resolved once at startup. The API client takes it
/// at construction; nothing else reads the environment afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub summary_path: PathBuf,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api/v1".to_string(),
            summary_path: PathBuf::from("data/freight_summary.json"),
            page_size: 10,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Ok(Self::load_from(&config_path)?.with_env_overrides())
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// FRETES_API_URL and FRETES_SUMMARY_PATH win over the config file.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("FRETES_API_URL") {
            self.api_base_url = url;
        }
        if let Ok(path) = std::env::var("FRETES_SUMMARY_PATH") {
            self.summary_path = PathBuf::from(path);
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("fretes").join("config.json"))
    }
}
