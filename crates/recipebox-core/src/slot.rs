// Durable key-value slots - where the recipe and favorites collections live
use crate::{Error, Result};
use async_trait::async_trait;
use recipebox_storage::SlotTable;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A named value that survives process restarts
///
/// Writes are all-or-nothing: after a failed `write` the previous value is
/// still what `read` returns. The stores built on top rely on that.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableSlot: Send + Sync {
    /// Current value under `key`, `None` if it was never written
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process slots. Gone when the process exits.
#[derive(Debug, Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableSlot for MemorySlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|e| Error::StorageRead(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| Error::StorageWrite(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a data directory
///
/// Writes go to a temp file next to the target and are renamed over it,
/// so a crash mid-write never leaves a half-written slot behind.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys become file names, so keep them boring
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::ConfigError(format!("Invalid slot key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl DurableSlot for FileSlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Slot file {} does not exist yet", path.display());
                Ok(None)
            }
            Err(e) => Err(Error::StorageRead(format!("{}: {}", path.display(), e))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::StorageWrite(format!("{}: {}", self.dir.display(), e)))?;

        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::StorageWrite(format!("{}: {}", tmp.display(), e)));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::StorageWrite(format!("{}: {}", path.display(), e)));
        }

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Slots kept in a SQLite database
pub struct SqliteSlot {
    table: Mutex<SlotTable>,
}

impl SqliteSlot {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path = db_path
            .to_str()
            .ok_or_else(|| Error::ConfigError(format!("Non UTF-8 path: {}", db_path.display())))?;

        let table = SlotTable::new(path).map_err(|e| Error::StorageRead(e.to_string()))?;
        Ok(Self::from_table(table))
    }

    pub fn from_table(table: SlotTable) -> Self {
        Self {
            table: Mutex::new(table),
        }
    }
}

#[async_trait]
impl DurableSlot for SqliteSlot {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let table = self
            .table
            .lock()
            .map_err(|e| Error::StorageRead(e.to_string()))?;
        table.get(key).map_err(|e| Error::StorageRead(e.to_string()))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let table = self
            .table
            .lock()
            .map_err(|e| Error::StorageWrite(e.to_string()))?;
        table
            .set(key, value)
            .map_err(|e| Error::StorageWrite(e.to_string()))
    }
}
