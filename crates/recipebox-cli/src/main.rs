use anyhow::Context;
use clap::Parser;
use recipebox_core::config::Config;
use recipebox_core::{
    Backend, CatalogRecipe, DurableSlot, MemorySlot, PersistentFavorites, Recipe, RecipeDraft,
    RecipeStore, StoreEvent,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXCERPT_CHARS: usize = 50;

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(version, about = "Keep your own recipes and favorites on this machine", long_about = None)]
struct Cli {
    /// Directory for stored recipes (overrides config)
    #[arg(long, global = true, env = "RECIPEBOX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: file, sqlite or memory (overrides config)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List your recipes
    List,
    /// Show one recipe in full
    Show {
        /// Position in the list or recipe id
        target: String,
    },
    /// Add a new recipe
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long)]
        description: String,
    },
    /// Edit a recipe. Fields you leave out keep their current value.
    Edit {
        /// Position in the list or recipe id
        target: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a recipe
    Delete {
        /// Position in the list or recipe id
        target: String,
    },
    /// Manage favorites
    #[command(subcommand)]
    Fav(FavCommands),
    /// List curated recipes from a catalog file
    Catalog {
        /// JSON array of catalog recipes
        file: PathBuf,
    },
    /// Inspect or write the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(clap::Subcommand)]
enum FavCommands {
    /// Favorite or unfavorite a recipe by id
    Toggle {
        id: String,
        /// Look the id up in this catalog file instead of your own recipes
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List favorites
    List,
    /// Unfavorite everything
    Clear,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the effective config
    Show,
    /// Write the default config file
    Init,
}

/// A recipe picked on the command line, by position or by id
enum Target {
    Index(usize),
    Id(String),
}

impl Target {
    fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) => Target::Index(index),
            Err(_) => Target::Id(raw.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipebox=info,recipebox_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }

    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return run_config(cmd, &config);
    }

    let slot = config
        .storage
        .open_slot()
        .context("Failed to open recipe storage")?;
    tracing::debug!(
        "Using {} storage at {:?}",
        config.storage.backend,
        config.storage.data_dir
    );
    let store = RecipeStore::with_key(slot.clone(), &config.storage.recipes_key);

    match command {
        Commands::List => {
            let recipes = store.list().await.context("Failed to load recipes")?;
            print_recipes(&recipes);
        }
        Commands::Show { target } => {
            let recipe = resolve(&store, &target).await?;
            print_recipe(&recipe);
        }
        Commands::Add {
            title,
            image,
            description,
        } => {
            let recipes = store
                .create(RecipeDraft::new(title, image, description))
                .await
                .context("Failed to save recipe")?;
            if let Some(recipe) = recipes.last() {
                println!("Added {} ({})", recipe.title, recipe.id);
            }
        }
        Commands::Edit {
            target,
            title,
            image,
            description,
        } => {
            let existing = resolve(&store, &target).await?;
            let mut draft = RecipeDraft::from(&existing);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(image) = image {
                draft.image_url = image;
            }
            if let Some(description) = description {
                draft.description = description;
            }

            store
                .update(&existing.id, draft)
                .await
                .context("Failed to save recipe")?;
            println!("Updated {}", existing.id);
        }
        Commands::Delete { target } => {
            let mut events = store.subscribe();
            let recipes = match Target::parse(&target) {
                Target::Index(index) => store.delete_at(index).await,
                Target::Id(id) => store.delete(&id).await,
            }
            .context("Failed to delete recipe")?;
            println!("Deleted. {} recipes left.", recipes.len());

            // A deleted recipe shouldn't linger in favorites
            if config.favorites.persist {
                let mut favorites = open_favorites(&config, slot).await?;
                while let Ok(event) = events.try_recv() {
                    if let StoreEvent::Deleted { .. } = event {
                        if favorites.forget(event.id()).await? {
                            tracing::info!("Dropped {} from favorites", event.id());
                        }
                    }
                }
            }
        }
        Commands::Fav(cmd) => {
            let mut favorites = open_favorites(&config, slot).await?;

            match cmd {
                FavCommands::Toggle { id, catalog } => {
                    let entry = match catalog {
                        Some(path) => load_catalog(&path)?
                            .into_iter()
                            .find(|c| c.recipe_id == id)
                            .with_context(|| format!("{} is not in {}", id, path.display()))?,
                        None => CatalogRecipe::from(&store.get(&id).await?),
                    };
                    let name = entry.recipe_name.clone();
                    favorites.toggle(entry).await?;

                    if favorites.contains(&id) {
                        println!("♥ {}", name);
                    } else {
                        println!("♡ {}", name);
                    }
                }
                FavCommands::Clear => {
                    favorites.clear().await.context("Failed to save favorites")?;
                    println!("Cleared favorites.");
                }
                FavCommands::List => {
                    if favorites.list().is_empty() {
                        println!("No favorite recipes yet!");
                    }
                    for entry in favorites.list() {
                        println!("♥ {}  {}", entry.recipe_name, entry.recipe_id);
                    }
                }
            }
        }
        Commands::Catalog { file } => {
            let favorites = open_favorites(&config, slot).await?;
            let catalog = load_catalog(&file)?;
            if catalog.is_empty() {
                println!("No recipes available");
            }
            for entry in &catalog {
                let mark = if favorites.contains(&entry.recipe_id) {
                    "♥"
                } else {
                    "♡"
                };
                println!("{} {}  {}", mark, entry.recipe_name, entry.recipe_id);
                println!("    {}", entry.instructions_or_default());
            }
        }
        Commands::Config(cmd) => run_config(&cmd, &config)?,
    }

    Ok(())
}

/// Favorites share the recipe slot unless they are session-only
async fn open_favorites(
    config: &Config,
    slot: Arc<dyn DurableSlot>,
) -> anyhow::Result<PersistentFavorites> {
    let slot: Arc<dyn DurableSlot> = if config.favorites.persist {
        slot
    } else {
        Arc::new(MemorySlot::new())
    };

    let favorites = PersistentFavorites::open_with_key(slot, &config.storage.favorites_key)
        .await
        .context("Failed to load favorites")?;
    Ok(favorites)
}

async fn resolve(store: &RecipeStore, target: &str) -> anyhow::Result<Recipe> {
    match Target::parse(target) {
        Target::Index(index) => {
            let recipes = store.list().await.context("Failed to load recipes")?;
            let len = recipes.len();
            recipes
                .into_iter()
                .nth(index)
                .ok_or_else(|| recipebox_core::Error::IndexOutOfRange { index, len }.into())
        }
        Target::Id(id) => Ok(store.get(&id).await?),
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<Vec<CatalogRecipe>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let catalog = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
    Ok(catalog)
}

fn run_config(cmd: &ConfigCommands, config: &Config) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let path = Config::config_path()?;
            println!("# {}", path.display());
            println!("{}", toml::to_string_pretty(config)?);
        }
        ConfigCommands::Init => {
            let path = Config::default().save().context("Failed to write config")?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_recipes(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("No recipes added yet.");
        return;
    }

    for (index, recipe) in recipes.iter().enumerate() {
        println!("{:>3}. {}  [{}]", index, recipe.title, recipe.id);
        println!("     {}", recipe.excerpt(EXCERPT_CHARS));
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title);
    println!("id:    {}", recipe.id);
    if recipe.has_image() {
        println!("image: {}", recipe.image_url);
    }
    println!();
    println!("{}", recipe.description);
}
