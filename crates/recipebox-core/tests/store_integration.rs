use recipebox_core::config::StorageConfig;
use recipebox_core::{
    Backend, CatalogRecipe, FileSlot, PersistentFavorites, RecipeDraft, RecipeStore, StoreEvent,
};
use std::sync::Arc;
use tempfile::TempDir;

fn file_store(dir: &TempDir) -> RecipeStore {
    RecipeStore::new(Arc::new(FileSlot::new(dir.path())))
}

#[tokio::test]
async fn test_soup_lifecycle() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);

    assert!(store.list().await.unwrap().is_empty());

    store
        .create(RecipeDraft::new("Soup", "", "Hot soup"))
        .await
        .unwrap();
    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Soup");
    assert_eq!(listed[0].description, "Hot soup");

    store
        .update_at(0, RecipeDraft::new("Cold Soup", "", "Chilled soup"))
        .await
        .unwrap();
    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Cold Soup");
    assert_eq!(listed[0].description, "Chilled soup");

    store.delete_at(0).await.unwrap();
    assert!(store.list().await.unwrap().is_empty());

    // Deleting everything leaves an empty array behind, not a missing slot
    let raw = std::fs::read_to_string(dir.path().join("customrecipes.json")).unwrap();
    assert_eq!(raw, "[]");
}

#[tokio::test]
async fn test_reload_from_disk_matches() {
    let dir = TempDir::new().unwrap();

    let written = {
        let store = file_store(&dir);
        store
            .create(RecipeDraft::new("Pancakes", "https://example.com/p.jpg", "Fluffy"))
            .await
            .unwrap();
        store
            .create(RecipeDraft::new("Omelette", "", "Three eggs"))
            .await
            .unwrap()
    };

    let reloaded = file_store(&dir).list().await.unwrap();
    assert_eq!(reloaded, written);
}

#[tokio::test]
async fn test_legacy_slot_file_is_read() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("customrecipes.json"),
        r#"[{"title":"Soup","image":"","description":"Hot soup"},{"title":"Salad","image":"http://img","description":"Green"}]"#,
    )
    .unwrap();

    let store = file_store(&dir);
    let first = store.list().await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].image_url, "http://img");

    // Ids assigned on first read are kept
    let again = file_store(&dir).list().await.unwrap();
    assert_eq!(first, again);
}

#[tokio::test]
async fn test_corrupt_file_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("customrecipes.json");
    std::fs::write(&path, "[{oops").unwrap();

    let store = file_store(&dir);
    assert!(store.list().await.is_err());
    assert!(store
        .create(RecipeDraft::new("Soup", "", "Hot soup"))
        .await
        .is_err());

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{oops");
}

#[tokio::test]
async fn test_sqlite_backend_from_config() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        backend: Backend::Sqlite,
        data_dir: Some(dir.path().to_path_buf()),
        ..StorageConfig::default()
    };

    let store = RecipeStore::with_key(config.open_slot().unwrap(), &config.recipes_key);
    let mut events = store.subscribe();
    store
        .create(RecipeDraft::new("Soup", "", "Hot soup"))
        .await
        .unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        StoreEvent::Created { index: 0, .. }
    ));

    let reopened = RecipeStore::with_key(config.open_slot().unwrap(), &config.recipes_key);
    assert_eq!(reopened.list().await.unwrap().len(), 1);
    assert!(dir.path().join("recipebox.db").exists());
}

#[tokio::test]
async fn test_favorite_user_recipe_by_id() {
    let dir = TempDir::new().unwrap();
    let slot = Arc::new(FileSlot::new(dir.path()));
    let store = RecipeStore::new(slot.clone());

    store
        .create(RecipeDraft::new("A", "", "first"))
        .await
        .unwrap();
    let recipes = store
        .create(RecipeDraft::new("B", "", "second"))
        .await
        .unwrap();
    let b = recipes[1].clone();

    let mut favorites: PersistentFavorites = PersistentFavorites::open(slot.clone()).await.unwrap();
    favorites.toggle(CatalogRecipe::from(&b)).await.unwrap();

    // Removing A moves B to position 0 but its favorite still points at B
    store.delete_at(0).await.unwrap();
    let recipes = store.list().await.unwrap();
    assert!(favorites.contains(&recipes[0].id));

    let reopened: PersistentFavorites = PersistentFavorites::open(slot).await.unwrap();
    assert_eq!(reopened.list()[0].recipe_name, "B");
}

#[tokio::test]
async fn test_deleted_recipe_is_dropped_from_favorites() {
    let dir = TempDir::new().unwrap();
    let slot = Arc::new(FileSlot::new(dir.path()));
    let store = RecipeStore::new(slot.clone());

    let recipes = store
        .create(RecipeDraft::new("Soup", "", "Hot soup"))
        .await
        .unwrap();
    let mut favorites: PersistentFavorites = PersistentFavorites::open(slot.clone()).await.unwrap();
    favorites
        .toggle(CatalogRecipe::from(&recipes[0]))
        .await
        .unwrap();

    let mut events = store.subscribe();
    store.delete_at(0).await.unwrap();

    let event = events.recv().await.unwrap();
    assert!(matches!(event, StoreEvent::Deleted { .. }));
    assert!(favorites.forget(event.id()).await.unwrap());

    let reopened: PersistentFavorites = PersistentFavorites::open(slot).await.unwrap();
    assert!(reopened.list().is_empty());
}
