mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mealkeep::RecipeBackend;
use mealkeep_remote::{RecipeApi, RemoteClient, RemoteConfig, StaticSecrets, resolve_base_url};
use mealkeep_store::{LocalRecipeStore, MigrationFlags, PhotoStore};
use mealkeep_sync::{
    LegacyDocumentsDir, LegacyJsonExport, LegacyListingCache, LikeStateManager, RecipeCache,
    StepStatus, StorageMigrator,
};

#[derive(Parser)]
#[command(name = "mealkeep")]
#[command(about = "Local-first recipe store with background sync to the remote library")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending storage migrations
    Migrate {
        /// Also print flag states and store counts afterwards
        #[arg(long)]
        verify: bool,
    },
    /// Reconcile the local store against the remote listing
    Sync {
        /// Refresh even when a cached listing exists
        #[arg(long)]
        force: bool,
    },
    /// List locally stored recipes
    List,
    /// Show one recipe in full
    Show {
        /// Recipe id
        id: String,
    },
    /// Toggle the like on a recipe
    Like {
        /// Recipe id
        id: String,
    },
    /// Remove a recipe (and its photos) from the local store
    Remove {
        /// Recipe id
        id: String,
    },
}

/// Every long-lived service, constructed once at startup and passed by
/// reference. There are no process-wide singletons.
struct Services {
    recipes: Arc<LocalRecipeStore>,
    photos: Arc<PhotoStore>,
    cache: RecipeCache,
    likes: LikeStateManager,
    migrator: StorageMigrator,
}

fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("could not determine data directory")?;
    let dir = base.join("mealkeep");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory: {}", dir.display()))?;
    Ok(dir)
}

fn build_services() -> Result<Services> {
    let mut app_config = config::load_config();
    let device_id = config::ensure_device_id(&mut app_config);

    let base_url = resolve_base_url(config::api_url_override(&app_config).as_deref());
    let client = RemoteClient::new(
        RemoteConfig {
            base_url,
            device_id,
        },
        Arc::new(StaticSecrets {
            api_key: config::api_key(&app_config),
            bearer_token: config::bearer_token(),
        }),
    )?;
    let backend: Arc<dyn RecipeBackend> = Arc::new(RecipeApi::new(client));

    let dir = data_dir()?;
    let db_path = dir.join("mealkeep.db");
    let recipes = Arc::new(LocalRecipeStore::open(&db_path)?);
    let photos = Arc::new(PhotoStore::open(&db_path)?);
    let flags = Arc::new(MigrationFlags::open(&db_path)?);

    let migrator = StorageMigrator::new(flags, recipes.clone(), photos.clone())
        .with_step(Box::new(LegacyJsonExport::new(
            dir.join("legacy_recipes.json"),
            recipes.clone(),
        )))
        .with_step(Box::new(LegacyDocumentsDir::new(
            dir.join("documents"),
            recipes.clone(),
            photos.clone(),
        )))
        .with_step(Box::new(LegacyListingCache::new(
            dir.join("listing_cache.json"),
            recipes.clone(),
        )));

    Ok(Services {
        cache: RecipeCache::new(backend.clone(), recipes.clone()),
        likes: LikeStateManager::new(backend),
        recipes,
        photos,
        migrator,
    })
}

/// Migrations run before any command that reads the store. Failures
/// warn and carry on; stale legacy data is still usable data.
async fn ensure_migrated(migrator: &StorageMigrator) {
    let report = migrator.run_all_pending().await;
    for step in &report.steps {
        if let StepStatus::Failed(reason) = &step.status {
            eprintln!("warning: migration step [{}] failed: {reason}", step.name);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    let services = build_services()?;

    match cli.command {
        Command::Migrate { verify } => commands::migrate::run(&services.migrator, verify).await,
        Command::Sync { force } => {
            ensure_migrated(&services.migrator).await;
            commands::sync::run(&services.cache, force).await
        }
        Command::List => {
            ensure_migrated(&services.migrator).await;
            commands::list::run(&services.recipes)
        }
        Command::Show { id } => {
            ensure_migrated(&services.migrator).await;
            commands::show::run(&services.recipes, &services.photos, &id)
        }
        Command::Like { id } => commands::like::run(&services.likes, &id).await,
        Command::Remove { id } => commands::remove::run(&services.recipes, &services.photos, &id),
    }
}
