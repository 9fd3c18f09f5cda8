use thiserror::Error;

/// All the ways things can go wrong in RecipeBox
///
/// Nothing here is fatal. Callers retry or fix their input.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field: {field}")]
    Validation { field: &'static str },

    #[error("Index {index} is out of range for a collection of {len} recipes")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Favorite entry has no identifier")]
    MissingIdentifier,

    #[error("Failed to read storage: {0}")]
    StorageRead(String),

    #[error("Failed to write storage: {0}")]
    StorageWrite(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
