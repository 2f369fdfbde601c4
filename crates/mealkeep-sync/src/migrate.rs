use std::sync::Arc;

use mealkeep::Feedback;
use mealkeep_store::{LocalRecipeStore, MigrationFlags, PhotoStore};

/// Step-level failure: the artifact itself could not be read or parsed.
/// Per-record failures never produce one of these; they are reported
/// through [`StepCounts::feedback`] and the step still completes.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("artifact read error: {0}")]
    Read(String),

    #[error("artifact parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// One named, idempotent import of a legacy storage generation.
#[async_trait::async_trait]
pub trait MigrationStep: Send + Sync {
    fn name(&self) -> &str;

    /// Import everything the legacy artifact holds. An absent artifact
    /// is a successful no-op. Returning `Err` means the whole step
    /// should be retried on the next run.
    async fn run(&self) -> Result<StepCounts, MigrationError>;
}

/// What one step run did, record by record.
#[derive(Debug, Clone, Default)]
pub struct StepCounts {
    pub migrated: u64,
    pub already_existed: u64,
    pub failed_records: u64,
    pub feedback: Vec<Feedback>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// Flag was already set; nothing ran.
    Skipped,
    /// Step ran and its flag is now set.
    Completed,
    /// Step failed; flag left unset so the next run retries it.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub counts: StepCounts,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn migrated(&self) -> u64 {
        self.steps.iter().map(|s| s.counts.migrated).sum()
    }

    pub fn already_existed(&self) -> u64 {
        self.steps.iter().map(|s| s.counts.already_existed).sum()
    }

    pub fn all_completed(&self) -> bool {
        self.steps
            .iter()
            .all(|s| !matches!(s.status, StepStatus::Failed(_)))
    }
}

/// Read-only snapshot for diagnostics; never mutates anything.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    /// Step name and whether its completion flag is set.
    pub steps: Vec<(String, bool)>,
    pub recipes: u64,
    pub photos: u64,
}

impl VerifyReport {
    pub fn all_completed(&self) -> bool {
        self.steps.iter().all(|(_, completed)| *completed)
    }
}

impl std::fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, completed) in &self.steps {
            let state = if *completed { "completed" } else { "pending" };
            writeln!(f, "{name}: {state}")?;
        }
        write!(f, "{} recipes, {} photo pairs stored", self.recipes, self.photos)
    }
}

/// Runs the ordered legacy migrations, each exactly once.
///
/// A step's durable flag is read before it runs and written only after
/// it finished; a failed step leaves its flag unset and is retried on
/// the next invocation. Nothing here can fail app startup: failures
/// degrade to "legacy data stays where it was until next time".
pub struct StorageMigrator {
    flags: Arc<MigrationFlags>,
    recipes: Arc<LocalRecipeStore>,
    photos: Arc<PhotoStore>,
    steps: Vec<Box<dyn MigrationStep>>,
}

impl StorageMigrator {
    pub fn new(
        flags: Arc<MigrationFlags>,
        recipes: Arc<LocalRecipeStore>,
        photos: Arc<PhotoStore>,
    ) -> Self {
        Self {
            flags,
            recipes,
            photos,
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: Box<dyn MigrationStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub async fn run_all_pending(&self) -> RunReport {
        let mut report = RunReport::default();

        for step in &self.steps {
            let name = step.name().to_owned();

            match self.flags.is_completed(&name) {
                Ok(true) => {
                    report.steps.push(StepReport {
                        name,
                        status: StepStatus::Skipped,
                        counts: StepCounts::default(),
                    });
                    continue;
                }
                Ok(false) => {}
                Err(error) => {
                    // Unreadable flag: run the step anyway. Steps are
                    // idempotent, so a duplicate run only costs time.
                    tracing::warn!(step = %name, error = %error, "could not read migration flag");
                }
            }

            match step.run().await {
                Ok(counts) => {
                    tracing::info!(
                        step = %name,
                        migrated = counts.migrated,
                        already_existed = counts.already_existed,
                        failed_records = counts.failed_records,
                        "migration step finished"
                    );
                    let status = match self.flags.mark_completed(&name) {
                        Ok(()) => StepStatus::Completed,
                        Err(error) => {
                            tracing::warn!(step = %name, error = %error, "flag write failed; step will re-run");
                            StepStatus::Failed(error.to_string())
                        }
                    };
                    report.steps.push(StepReport {
                        name,
                        status,
                        counts,
                    });
                }
                Err(error) => {
                    tracing::warn!(step = %name, error = %error, "migration step failed; retrying next run");
                    report.steps.push(StepReport {
                        name,
                        status: StepStatus::Failed(error.to_string()),
                        counts: StepCounts::default(),
                    });
                }
            }
        }

        report
    }

    pub fn verify(&self) -> VerifyReport {
        let steps = self
            .steps
            .iter()
            .map(|step| {
                let name = step.name().to_owned();
                let completed = self.flags.is_completed(&name).unwrap_or(false);
                (name, completed)
            })
            .collect();

        VerifyReport {
            steps,
            recipes: self.recipes.count().unwrap_or(0),
            photos: self.photos.count().unwrap_or(0),
        }
    }
}
