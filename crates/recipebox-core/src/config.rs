use crate::favorites::DEFAULT_FAVORITES_KEY;
use crate::slot::{DurableSlot, FileSlot, MemorySlot, SqliteSlot};
use crate::store::DEFAULT_RECIPES_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Main configuration structure
///
/// This gets loaded from config file and CLI args.
/// Priority: CLI > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub favorites: FavoritesConfig,
}

impl Config {
    /// Load config from default location, defaults if there is no file yet
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.storage.validate()?;
        Ok(config)
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(config_path)
    }

    /// Get the config file path
    /// Uses XDG on Linux/macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("recipebox");

        Ok(config_dir.join("config.toml"))
    }
}

/// Which durable slot backend holds the collections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "sqlite" => Ok(Backend::Sqlite),
            "memory" => Ok(Backend::Memory),
            other => Err(crate::Error::ConfigError(format!(
                "Unknown storage backend: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::File => write!(f, "file"),
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Where slot files or the database go. Platform data dir if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_recipes_key")]
    pub recipes_key: String,

    #[serde(default = "default_favorites_key")]
    pub favorites_key: String,
}

fn default_recipes_key() -> String {
    DEFAULT_RECIPES_KEY.to_string()
}

fn default_favorites_key() -> String {
    DEFAULT_FAVORITES_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: None,
            recipes_key: default_recipes_key(),
            favorites_key: default_favorites_key(),
        }
    }
}

impl StorageConfig {
    /// Configured data dir, falling back to the platform one
    pub fn resolved_data_dir(&self) -> crate::Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
                .join("recipebox")),
        }
    }

    /// Recipes and favorites share one backend, so they need their own keys
    pub fn validate(&self) -> crate::Result<()> {
        if self.recipes_key == self.favorites_key {
            return Err(crate::Error::ConfigError(format!(
                "recipes_key and favorites_key must differ (both are {:?})",
                self.recipes_key
            )));
        }
        Ok(())
    }

    /// Build the slot backend this config describes
    pub fn open_slot(&self) -> crate::Result<Arc<dyn DurableSlot>> {
        self.validate()?;

        let slot: Arc<dyn DurableSlot> = match self.backend {
            Backend::File => Arc::new(FileSlot::new(self.resolved_data_dir()?)),
            Backend::Sqlite => Arc::new(SqliteSlot::open(
                &self.resolved_data_dir()?.join("recipebox.db"),
            )?),
            Backend::Memory => Arc::new(MemorySlot::new()),
        };
        Ok(slot)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Keep favorites across runs. Off means they reset every session.
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_persist() -> bool {
    true
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
        }
    }
}
