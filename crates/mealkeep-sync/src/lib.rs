pub mod cache;
pub mod legacy;
pub mod likes;
pub mod migrate;

pub use cache::{RecipeCache, merge_local_first};
pub use legacy::{LegacyDocumentsDir, LegacyJsonExport, LegacyListingCache};
pub use likes::LikeStateManager;
pub use migrate::{
    MigrationError, MigrationStep, RunReport, StepCounts, StepReport, StepStatus, StorageMigrator,
    VerifyReport,
};
