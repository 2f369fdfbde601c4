use anyhow::Result;
use mealkeep_sync::{StepStatus, StorageMigrator};

pub async fn run(migrator: &StorageMigrator, verify: bool) -> Result<()> {
    let report = migrator.run_all_pending().await;

    for step in &report.steps {
        match &step.status {
            StepStatus::Skipped => println!("{}: already completed", step.name),
            StepStatus::Completed => println!(
                "{}: {} migrated, {} already existed, {} failed",
                step.name,
                step.counts.migrated,
                step.counts.already_existed,
                step.counts.failed_records
            ),
            StepStatus::Failed(reason) => {
                println!("{}: failed ({reason}), will retry next run", step.name)
            }
        }
        for feedback in &step.counts.feedback {
            eprintln!("{feedback}");
        }
    }

    if verify {
        println!("{}", migrator.verify());
    }

    Ok(())
}
