pub mod flags;
pub mod photos;
pub mod schema;
pub mod store;

pub use flags::MigrationFlags;
pub use photos::PhotoStore;
pub use store::{LocalRecipeStore, StoreError};
