use serde::{Deserialize, Serialize};

use crate::recipe::RecipeId;

/// Transient like state for one recipe as seen by the current device.
/// Rebuildable at any time from a remote count refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    pub liked: bool,
    pub count: i64,
}

/// One entry of a batch like-count refresh from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCount {
    pub recipe_id: RecipeId,
    pub liked: bool,
    pub count: i64,
}
