use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::store;
use crate::core::visibility::UnleakableDomains;

/// Runtime config.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub unleakable_domains: UnleakableDomains,
    pub data_dir: PathBuf,
    pub view_pager_offscreen_limit: bool,
    pub animate_gif_avatars: bool,
    pub use_htl_stream: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unleakable_domains: UnleakableDomains::default(),
            data_dir: store::default_data_dir(),
            view_pager_offscreen_limit: false,
            animate_gif_avatars: false,
            use_htl_stream: false,
        }
    }
}

/// On-disk representation. Every field is optional and falls back to the
/// built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub unleakable_domains: Option<Vec<String>>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub view_pager_offscreen_limit: Option<bool>,
    #[serde(default)]
    pub animate_gif_avatars: Option<bool>,
    #[serde(default)]
    pub use_htl_stream: Option<bool>,
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tootshell")
        .join("config.json")
}

impl FileConfig {
    pub fn load() -> Result<Option<Self>, String> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Option<Self>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
        let cfg: FileConfig =
            serde_json::from_str(&data).map_err(|e| format!("parse config: {e}"))?;
        Ok(Some(cfg))
    }
}

fn split_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join("accounts.json")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Layer a file config over the defaults.
    pub fn from_file_config(fc: &FileConfig) -> Self {
        let defaults = Config::default();
        Config {
            unleakable_domains: fc
                .unleakable_domains
                .clone()
                .map(UnleakableDomains::new)
                .unwrap_or(defaults.unleakable_domains),
            data_dir: fc.data_dir.clone().unwrap_or(defaults.data_dir),
            view_pager_offscreen_limit: fc
                .view_pager_offscreen_limit
                .unwrap_or(defaults.view_pager_offscreen_limit),
            animate_gif_avatars: fc.animate_gif_avatars.unwrap_or(defaults.animate_gif_avatars),
            use_htl_stream: fc.use_htl_stream.unwrap_or(defaults.use_htl_stream),
        }
    }

    /// Apply `TOOTSHELL_*` env vars on top.
    fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("TOOTSHELL_UNLEAKABLE_DOMAINS") {
            self.unleakable_domains = UnleakableDomains::new(split_domains(&v));
        }
        if let Ok(v) = std::env::var("TOOTSHELL_DATA_DIR") {
            if !v.trim().is_empty() {
                self.data_dir = PathBuf::from(v);
            }
        }
        self
    }

    /// Resolution order: env vars → config file → defaults.
    pub fn resolve() -> Self {
        let base = match FileConfig::load() {
            Ok(Some(fc)) => {
                log::info!("Config loaded from file");
                Self::from_file_config(&fc)
            }
            Ok(None) => {
                log::info!("No config file found, using defaults");
                Config::default()
            }
            Err(e) => {
                log::warn!("Config file error: {}", e);
                Config::default()
            }
        };
        base.apply_env()
    }
}
