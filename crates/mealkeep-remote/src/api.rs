use mealkeep::{LikeCount, NetworkError, Recipe, RecipeBackend, RecipeId};
use reqwest::Method;
use serde_json::json;

use crate::client::RemoteClient;
use crate::wire::{CountsResponse, ListingResponse};

/// The remote object store's recipe endpoints, typed.
pub struct RecipeApi {
    client: RemoteClient,
}

impl RecipeApi {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl RecipeBackend for RecipeApi {
    fn label(&self) -> &str {
        "remote"
    }

    async fn fetch_recipes(&self) -> Result<Vec<Recipe>, NetworkError> {
        let listing: ListingResponse = self.client.get_json("recipes").await?;
        Ok(listing
            .recipes
            .into_iter()
            .map(|dto| dto.into_recipe())
            .collect())
    }

    async fn set_liked(&self, id: &RecipeId, liked: bool) -> Result<(), NetworkError> {
        if id.is_empty() {
            return Err(NetworkError::InvalidInput("empty recipe id".to_owned()));
        }
        self.client
            .request(
                Method::PUT,
                &format!("recipes/{id}/like"),
                Some(&json!({ "liked": liked })),
                &[],
            )
            .await?;
        Ok(())
    }

    async fn like_counts(&self, ids: &[RecipeId]) -> Result<Vec<LikeCount>, NetworkError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let response: CountsResponse = self
            .client
            .send_json(Method::POST, "recipes/likes", &json!({ "ids": id_strings }))
            .await?;
        Ok(response
            .counts
            .into_iter()
            .map(|dto| dto.into_like_count())
            .collect())
    }
}
