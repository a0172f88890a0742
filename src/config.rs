//! User configuration stored as JSON next to the other per-user settings.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::DEFAULT_COLOR;
use crate::db::DEFAULT_RECENT_LIMIT;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub schema_version: u32,
    /// Overrides the database location under the user's data directory.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_category_color")]
    pub default_category_color: String,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_category_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_recent_limit() -> u32 {
    DEFAULT_RECENT_LIMIT
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            db_path: None,
            default_category_color: default_category_color(),
            recent_limit: default_recent_limit(),
            log_level: default_log_level(),
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("config.json"),
        }
    }

    /// `None` when the platform has no per-user config directory.
    pub fn from_default_location() -> Option<Self> {
        let mut dir = dirs::config_dir()?;
        dir.push("timeloop");
        Some(Self::from_dir(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut config: AppConfig =
            serde_json::from_str(&raw).context("failed to parse timeloop config json")?;
        if self.migrate(&mut config) {
            self.save(&config)?;
        }
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Returns true when the config was changed and needs saving.
    fn migrate(&self, config: &mut AppConfig) -> bool {
        let mut changed = false;
        if config.schema_version < CURRENT_SCHEMA_VERSION {
            warn!(
                from = config.schema_version,
                to = CURRENT_SCHEMA_VERSION,
                "migrating timeloop config schema"
            );
            config.schema_version = CURRENT_SCHEMA_VERSION;
            changed = true;
        }
        if !crate::color::is_valid_hex(&config.default_category_color) {
            warn!(
                color = %config.default_category_color,
                "invalid default category color in config, resetting"
            );
            config.default_category_color = default_category_color();
            changed = true;
        }
        changed
    }
}

/// Loads the stored config, or the defaults when there is nowhere to load it from.
pub fn load_or_default(store: Option<&ConfigStore>) -> Result<AppConfig> {
    match store {
        Some(store) => store.load_or_init(),
        None => Ok(AppConfig::default()),
    }
}
