use anyhow::Context;
use folio_editor::BookLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one JSON document per book
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Optional path to a book layout; the built-in layout otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Show one page at a time
    #[serde(default)]
    pub mobile: bool,
}

fn default_store_dir() -> String {
    ".folio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to the store directory
    pub fn get_store_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_dir)
    }

    /// Layout named by the config, or the built-in one
    pub fn load_layout(&self, cwd: &str) -> anyhow::Result<BookLayout> {
        match &self.layout {
            Some(path) => {
                let path = PathBuf::from(cwd).join(path);
                BookLayout::from_file(&path)
                    .with_context(|| format!("Failed to load layout {}", path.display()))
            }
            None => Ok(BookLayout::standard()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            layout: None,
            log_level: default_log_level(),
            mobile: false,
        }
    }
}
