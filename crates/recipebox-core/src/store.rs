// The user's own recipes, persisted as one JSON array in a durable slot
use crate::models::{new_recipe_id, Recipe, RecipeDraft};
use crate::slot::DurableSlot;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Slot key the recipe collection lives under unless configured otherwise
pub const DEFAULT_RECIPES_KEY: &str = "customrecipes";

const EVENT_CAPACITY: usize = 64;

/// Something changed in the collection. Sent after the change is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { id: String, index: usize },
    Updated { id: String, index: usize },
    Deleted { id: String, index: usize },
}

impl StoreEvent {
    pub fn id(&self) -> &str {
        match self {
            StoreEvent::Created { id, .. }
            | StoreEvent::Updated { id, .. }
            | StoreEvent::Deleted { id, .. } => id,
        }
    }
}

/// CRUD over the ordered recipe collection
///
/// Every operation starts from what is in the slot right now. Mutations do one
/// full read-modify-write and hand back the new collection, so callers never
/// need a separate reload. Views that want to hear about changes made
/// elsewhere call [`RecipeStore::subscribe`].
pub struct RecipeStore {
    slot: Arc<dyn DurableSlot>,
    key: String,
    events: broadcast::Sender<StoreEvent>,
}

impl RecipeStore {
    pub fn new(slot: Arc<dyn DurableSlot>) -> Self {
        Self::with_key(slot, DEFAULT_RECIPES_KEY)
    }

    pub fn with_key(slot: Arc<dyn DurableSlot>, key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slot,
            key: key.into(),
            events,
        }
    }

    /// Listen for changes made through this store
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Current collection. Empty if nothing was ever saved.
    ///
    /// Records saved before ids existed get one here, and the collection is
    /// written back once so those ids stick. If that write fails the list is
    /// still returned and the next mutation persists the ids instead.
    pub async fn list(&self) -> Result<Vec<Recipe>> {
        let (recipes, assigned) = self.load().await?;

        if assigned > 0 {
            info!("Assigned ids to {} stored recipes", assigned);
            if let Err(e) = self.save(&recipes).await {
                warn!("Could not write back assigned ids to {}: {}", self.key, e);
            }
        }

        Ok(recipes)
    }

    /// Look a recipe up by id
    pub async fn get(&self, id: &str) -> Result<Recipe> {
        let recipes = self.list().await?;
        recipes
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Where a recipe currently sits in the collection
    pub async fn position(&self, id: &str) -> Result<usize> {
        let recipes = self.list().await?;
        find_position(&recipes, id)
    }

    /// Append a new recipe
    pub async fn create(&self, draft: RecipeDraft) -> Result<Vec<Recipe>> {
        draft.validate()?;

        let (mut recipes, _) = self.load().await?;
        let recipe = Recipe::from_draft(draft);
        let id = recipe.id.clone();
        recipes.push(recipe);

        self.save(&recipes).await?;

        let index = recipes.len() - 1;
        info!("Created recipe {} at position {}", id, index);
        self.emit(StoreEvent::Created { id, index });
        Ok(recipes)
    }

    /// Replace the recipe at `index`, keeping its id
    pub async fn update_at(&self, index: usize, draft: RecipeDraft) -> Result<Vec<Recipe>> {
        draft.validate()?;

        let (mut recipes, _) = self.load().await?;
        check_bounds(index, recipes.len())?;
        recipes[index].apply(draft);

        self.save(&recipes).await?;

        let id = recipes[index].id.clone();
        info!("Updated recipe {} at position {}", id, index);
        self.emit(StoreEvent::Updated { id, index });
        Ok(recipes)
    }

    /// Remove the recipe at `index`. Later recipes move up one place.
    pub async fn delete_at(&self, index: usize) -> Result<Vec<Recipe>> {
        let (mut recipes, _) = self.load().await?;
        check_bounds(index, recipes.len())?;
        let removed = recipes.remove(index);

        self.save(&recipes).await?;

        info!("Deleted recipe {} from position {}", removed.id, index);
        self.emit(StoreEvent::Deleted {
            id: removed.id,
            index,
        });
        Ok(recipes)
    }

    /// Replace the recipe with the given id
    pub async fn update(&self, id: &str, draft: RecipeDraft) -> Result<Vec<Recipe>> {
        draft.validate()?;

        let (mut recipes, _) = self.load().await?;
        let index = find_position(&recipes, id)?;
        recipes[index].apply(draft);

        self.save(&recipes).await?;

        info!("Updated recipe {} at position {}", id, index);
        self.emit(StoreEvent::Updated {
            id: id.to_string(),
            index,
        });
        Ok(recipes)
    }

    /// Remove the recipe with the given id
    pub async fn delete(&self, id: &str) -> Result<Vec<Recipe>> {
        let (mut recipes, _) = self.load().await?;
        let index = find_position(&recipes, id)?;
        recipes.remove(index);

        self.save(&recipes).await?;

        info!("Deleted recipe {} from position {}", id, index);
        self.emit(StoreEvent::Deleted {
            id: id.to_string(),
            index,
        });
        Ok(recipes)
    }

    /// Read and parse the slot. Returns the collection and how many records
    /// were missing an id.
    async fn load(&self) -> Result<(Vec<Recipe>, usize)> {
        let Some(contents) = self.slot.read(&self.key).await? else {
            debug!("Slot {} is empty", self.key);
            return Ok((Vec::new(), 0));
        };

        let mut recipes: Vec<Recipe> = serde_json::from_str(&contents).map_err(|e| {
            warn!("Slot {} holds unreadable data: {}", self.key, e);
            Error::StorageRead(format!("Corrupt data in slot {}: {}", self.key, e))
        })?;

        let mut assigned = 0;
        for recipe in recipes.iter_mut().filter(|r| r.id.is_empty()) {
            recipe.id = new_recipe_id();
            assigned += 1;
        }

        debug!("Loaded {} recipes from {}", recipes.len(), self.key);
        Ok((recipes, assigned))
    }

    async fn save(&self, recipes: &[Recipe]) -> Result<()> {
        let contents = serde_json::to_string(recipes)?;
        self.slot.write(&self.key, &contents).await
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

fn check_bounds(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}

fn find_position(recipes: &[Recipe], id: &str) -> Result<usize> {
    recipes
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(id.to_string()))
}
