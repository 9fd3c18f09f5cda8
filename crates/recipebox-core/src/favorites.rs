use crate::models::{CatalogRecipe, Recipe};
use crate::slot::DurableSlot;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Slot key persisted favorites live under unless configured otherwise
pub const DEFAULT_FAVORITES_KEY: &str = "favoriterecipes";

/// Anything that can be favorited. The id must stay the same for the
/// record's whole life.
pub trait Favorite: Clone {
    fn favorite_id(&self) -> &str;
}

impl Favorite for CatalogRecipe {
    fn favorite_id(&self) -> &str {
        &self.recipe_id
    }
}

impl Favorite for Recipe {
    fn favorite_id(&self) -> &str {
        &self.id
    }
}

/// Insertion-ordered set of favorites, at most one entry per id
#[derive(Debug, Clone)]
pub struct FavoritesRegistry<E = CatalogRecipe> {
    entries: Vec<E>,
}

impl<E: Favorite> FavoritesRegistry<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from a list that may contain the same id twice. First one wins.
    pub fn from_entries(entries: Vec<E>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            if !entry.favorite_id().is_empty() && !registry.contains(entry.favorite_id()) {
                registry.entries.push(entry);
            }
        }
        registry
    }

    /// Favorite the entry, or unfavorite it if its id is already here
    pub fn toggle(&mut self, entry: E) -> Result<&[E]> {
        if entry.favorite_id().is_empty() {
            return Err(Error::MissingIdentifier);
        }

        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.favorite_id() == entry.favorite_id())
        {
            let removed = self.entries.remove(pos);
            debug!("Unfavorited {}", removed.favorite_id());
        } else {
            debug!("Favorited {}", entry.favorite_id());
            self.entries.push(entry);
        }

        Ok(&self.entries)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.favorite_id() == id)
    }

    pub fn list(&self) -> &[E] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the entry with this id, if present
    pub fn remove(&mut self, id: &str) -> Option<E> {
        let pos = self.entries.iter().position(|e| e.favorite_id() == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E: Favorite> Default for FavoritesRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A registry that writes itself to a durable slot after every toggle
pub struct PersistentFavorites<E = CatalogRecipe> {
    registry: FavoritesRegistry<E>,
    slot: Arc<dyn DurableSlot>,
    key: String,
}

impl<E> PersistentFavorites<E>
where
    E: Favorite + Serialize + DeserializeOwned,
{
    pub async fn open(slot: Arc<dyn DurableSlot>) -> Result<Self> {
        Self::open_with_key(slot, DEFAULT_FAVORITES_KEY).await
    }

    pub async fn open_with_key(slot: Arc<dyn DurableSlot>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        let registry = match slot.read(&key).await? {
            Some(contents) => {
                let entries: Vec<E> = serde_json::from_str(&contents).map_err(|e| {
                    warn!("Slot {} holds unreadable favorites: {}", key, e);
                    Error::StorageRead(format!("Corrupt data in slot {}: {}", key, e))
                })?;
                FavoritesRegistry::from_entries(entries)
            }
            None => FavoritesRegistry::new(),
        };

        debug!("Opened {} favorites from {}", registry.len(), key);
        Ok(Self {
            registry,
            slot,
            key,
        })
    }

    /// Toggle and persist. If the write fails nothing changes.
    pub async fn toggle(&mut self, entry: E) -> Result<&[E]> {
        let previous = self.registry.clone();
        self.registry.toggle(entry)?;
        self.persist(previous).await?;
        Ok(self.registry.list())
    }

    /// Unfavorite a record that no longer exists. Returns whether it was here.
    pub async fn forget(&mut self, id: &str) -> Result<bool> {
        let previous = self.registry.clone();
        if self.registry.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(previous).await?;
        Ok(true)
    }

    /// Unfavorite everything
    pub async fn clear(&mut self) -> Result<()> {
        let previous = self.registry.clone();
        self.registry.clear();
        self.persist(previous).await
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn list(&self) -> &[E] {
        self.registry.list()
    }

    /// Write the current set, restoring `previous` if the write fails
    async fn persist(&mut self, previous: FavoritesRegistry<E>) -> Result<()> {
        let contents = serde_json::to_string(self.registry.list())?;
        if let Err(e) = self.slot.write(&self.key, &contents).await {
            self.registry = previous;
            return Err(e);
        }

        info!("Saved {} favorites", self.registry.len());
        Ok(())
    }
}
