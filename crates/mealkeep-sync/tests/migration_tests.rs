use std::fs;
use std::path::Path;
use std::sync::Arc;

use mealkeep::test_support::local_recipe;
use mealkeep::{Origin, RecipeId};
use mealkeep_store::{LocalRecipeStore, MigrationFlags, PhotoStore};
use mealkeep_sync::{
    LegacyDocumentsDir, LegacyJsonExport, LegacyListingCache, StepStatus, StorageMigrator,
};

fn stores() -> (Arc<MigrationFlags>, Arc<LocalRecipeStore>, Arc<PhotoStore>) {
    (
        Arc::new(MigrationFlags::open_in_memory().unwrap()),
        Arc::new(LocalRecipeStore::open_in_memory().unwrap()),
        Arc::new(PhotoStore::open_in_memory().unwrap()),
    )
}

fn write_v2_document(dir: &Path, id: &str, name: &str) {
    fs::write(
        dir.join(format!("{id}.json")),
        format!(
            r#"{{
                "id": "{id}",
                "name": "{name}",
                "description": "{name} from the old documents folder",
                "ingredients": [{{"name": "salt", "amount": "a pinch"}}],
                "instructions": ["Cook it."],
                "created_at": 1650000000
            }}"#
        ),
    )
    .unwrap();
}

fn documents_migrator(
    dir: &Path,
    flags: &Arc<MigrationFlags>,
    recipes: &Arc<LocalRecipeStore>,
    photos: &Arc<PhotoStore>,
) -> StorageMigrator {
    StorageMigrator::new(flags.clone(), recipes.clone(), photos.clone()).with_step(Box::new(
        LegacyDocumentsDir::new(dir, recipes.clone(), photos.clone()),
    ))
}

#[tokio::test]
async fn documents_dir_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();

    write_v2_document(dir.path(), "r1", "Soup");
    write_v2_document(dir.path(), "r2", "Stew");
    write_v2_document(dir.path(), "r3", "Chili");
    // One of the three is already held locally.
    recipes.save(&local_recipe("r2", "My Stew")).unwrap();

    let migrator = documents_migrator(dir.path(), &flags, &recipes, &photos);
    let report = migrator.run_all_pending().await;

    assert_eq!(report.steps.len(), 1);
    let step = &report.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.counts.migrated, 2);
    assert_eq!(step.counts.already_existed, 1);
    assert_eq!(step.counts.failed_records, 0);

    assert_eq!(recipes.count().unwrap(), 3);
    // The pre-existing record was not clobbered by the import.
    assert_eq!(
        recipes.get(&RecipeId::new("r2")).unwrap().unwrap().name,
        "My Stew"
    );
    assert!(flags.is_completed("legacy-documents-dir").unwrap());

    let verify = migrator.verify();
    assert!(verify.all_completed());
    assert_eq!(verify.recipes, 3);
}

#[tokio::test]
async fn running_twice_imports_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();

    write_v2_document(dir.path(), "r1", "Soup");
    write_v2_document(dir.path(), "r2", "Stew");

    let migrator = documents_migrator(dir.path(), &flags, &recipes, &photos);

    let first = migrator.run_all_pending().await;
    assert_eq!(first.migrated(), 2);
    let snapshot = recipes.all().unwrap();

    let second = migrator.run_all_pending().await;
    assert_eq!(second.migrated(), 0);
    assert_eq!(second.steps[0].status, StepStatus::Skipped);
    assert_eq!(recipes.all().unwrap(), snapshot);
}

#[tokio::test]
async fn absent_artifacts_complete_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();

    let migrator = StorageMigrator::new(flags.clone(), recipes.clone(), photos.clone())
        .with_step(Box::new(LegacyJsonExport::new(
            dir.path().join("legacy_recipes.json"),
            recipes.clone(),
        )))
        .with_step(Box::new(LegacyDocumentsDir::new(
            dir.path().join("documents"),
            recipes.clone(),
            photos.clone(),
        )))
        .with_step(Box::new(LegacyListingCache::new(
            dir.path().join("listing_cache.json"),
            recipes.clone(),
        )));

    let report = migrator.run_all_pending().await;

    assert!(report.all_completed());
    assert_eq!(report.migrated(), 0);
    for step in &report.steps {
        assert_eq!(step.status, StepStatus::Completed);
    }
    assert!(flags.is_completed("legacy-json-export").unwrap());
    assert!(flags.is_completed("legacy-documents-dir").unwrap());
    assert!(flags.is_completed("legacy-listing-cache").unwrap());
}

#[tokio::test]
async fn malformed_record_is_skipped_without_aborting_the_step() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();
    let export = dir.path().join("legacy_recipes.json");

    fs::write(
        &export,
        r#"[
            {"meal_name": "Good One", "recipe_steps": ["Cook."]},
            42,
            {"meal_name": "Good Two", "recipe_steps": ["Bake."]}
        ]"#,
    )
    .unwrap();

    let migrator = StorageMigrator::new(flags.clone(), recipes.clone(), photos.clone()).with_step(
        Box::new(LegacyJsonExport::new(&export, recipes.clone())),
    );
    let report = migrator.run_all_pending().await;

    let step = &report.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.counts.migrated, 2);
    assert_eq!(step.counts.failed_records, 1);
    assert_eq!(step.counts.feedback.len(), 1);
    assert!(step.counts.feedback[0].is_warning());
    assert!(flags.is_completed("legacy-json-export").unwrap());
}

#[tokio::test]
async fn corrupt_artifact_is_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();
    let export = dir.path().join("legacy_recipes.json");

    fs::write(&export, "{ this is not an array").unwrap();

    let migrator = StorageMigrator::new(flags.clone(), recipes.clone(), photos.clone()).with_step(
        Box::new(LegacyJsonExport::new(&export, recipes.clone())),
    );

    let failed = migrator.run_all_pending().await;
    assert!(matches!(failed.steps[0].status, StepStatus::Failed(_)));
    assert!(!flags.is_completed("legacy-json-export").unwrap());

    // The artifact is repaired before the next startup.
    fs::write(&export, r#"[{"meal_name": "Recovered", "recipe_steps": []}]"#).unwrap();

    let recovered = migrator.run_all_pending().await;
    assert_eq!(recovered.steps[0].status, StepStatus::Completed);
    assert_eq!(recovered.migrated(), 1);
    assert!(flags.is_completed("legacy-json-export").unwrap());
}

#[tokio::test]
async fn v1_records_derive_stable_ids_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (_, recipes, photos) = stores();
    let export = dir.path().join("legacy_recipes.json");

    fs::write(
        &export,
        r#"[{"meal_name": "Pancakes", "created_at": 1600000000}]"#,
    )
    .unwrap();

    // Two migrators with independent flag stores simulate a flag write
    // that never landed: the step re-runs in full.
    let first = StorageMigrator::new(
        Arc::new(MigrationFlags::open_in_memory().unwrap()),
        recipes.clone(),
        photos.clone(),
    )
    .with_step(Box::new(LegacyJsonExport::new(&export, recipes.clone())));
    let second = StorageMigrator::new(
        Arc::new(MigrationFlags::open_in_memory().unwrap()),
        recipes.clone(),
        photos.clone(),
    )
    .with_step(Box::new(LegacyJsonExport::new(&export, recipes.clone())));

    assert_eq!(first.run_all_pending().await.migrated(), 1);
    let rerun = second.run_all_pending().await;

    // Same record, same derived id: deduplicated, not duplicated.
    assert_eq!(rerun.migrated(), 0);
    assert_eq!(rerun.already_existed(), 1);
    assert_eq!(recipes.count().unwrap(), 1);
}

#[tokio::test]
async fn photos_beside_documents_are_imported() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();

    write_v2_document(dir.path(), "r1", "Soup");
    fs::write(dir.path().join("r1_before.jpg"), b"before-bytes").unwrap();

    let migrator = documents_migrator(dir.path(), &flags, &recipes, &photos);
    migrator.run_all_pending().await;

    let pair = photos.get(&RecipeId::new("r1")).unwrap().unwrap();
    assert_eq!(pair.before.as_deref(), Some(b"before-bytes".as_slice()));
    assert!(pair.after.is_none());
}

#[tokio::test]
async fn listing_cache_imports_unseen_entries_as_remote() {
    let dir = tempfile::tempdir().unwrap();
    let (flags, recipes, photos) = stores();
    let cache_file = dir.path().join("listing_cache.json");

    fs::write(
        &cache_file,
        r#"{
            "recipes": [
                {"id": "remote-1", "name": "Ramen", "instructions": ["Boil."]},
                {"id": "mine", "name": "Shadowed"}
            ]
        }"#,
    )
    .unwrap();
    recipes.save(&local_recipe("mine", "My Version")).unwrap();

    let migrator = StorageMigrator::new(flags.clone(), recipes.clone(), photos.clone()).with_step(
        Box::new(LegacyListingCache::new(&cache_file, recipes.clone())),
    );
    let report = migrator.run_all_pending().await;

    assert_eq!(report.migrated(), 1);
    assert_eq!(report.already_existed(), 1);

    let imported = recipes.get(&RecipeId::new("remote-1")).unwrap().unwrap();
    assert_eq!(imported.origin, Origin::Remote);
    assert_eq!(
        recipes.get(&RecipeId::new("mine")).unwrap().unwrap().name,
        "My Version"
    );
}
