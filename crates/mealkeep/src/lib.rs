pub mod backend;
pub mod coordinator;
pub mod error;
pub mod feedback;
pub mod like;
pub mod photo;
pub mod recipe;

pub use backend::RecipeBackend;
pub use coordinator::{FetchCoordinator, MigrationCoordinator, MigrationState};
pub use error::{FetchError, NetworkError};
pub use feedback::Feedback;
pub use like::{LikeCount, LikeState};
pub use photo::PhotoPair;
pub use recipe::{IngredientUsed, Nutrition, Origin, Recipe, RecipeId};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
