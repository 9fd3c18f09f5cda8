// Core recipe collection logic - storage, CRUD and favorites, no UI
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod slot;
pub mod store;

pub use config::{Backend, Config};
pub use error::Error;
pub use favorites::{Favorite, FavoritesRegistry, PersistentFavorites};
pub use models::{CatalogRecipe, Recipe, RecipeDraft};
pub use slot::{DurableSlot, FileSlot, MemorySlot, SqliteSlot};
pub use store::{RecipeStore, StoreEvent};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
