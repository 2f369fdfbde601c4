use std::sync::Arc;

use mealkeep::{NetworkError, Origin, RecipeBackend, RecipeId};
use mealkeep_remote::{RecipeApi, RemoteClient, RemoteConfig, StaticSecrets};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server_uri: &str) -> RecipeApi {
    let client = RemoteClient::new(
        RemoteConfig {
            base_url: server_uri.to_owned(),
            device_id: "device-test".to_owned(),
        },
        Arc::new(StaticSecrets::default()),
    )
    .unwrap();
    RecipeApi::new(client)
}

#[tokio::test]
async fn fetch_recipes_maps_listing_to_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recipes": [
                {
                    "id": "r1",
                    "name": "Frittata",
                    "description": "Oven eggs",
                    "instructions": ["Whisk.", "Bake."],
                    "tags": ["brunch"],
                    "created_at": 1_700_000_000u64
                },
                {"id": "r2", "name": "Salad"}
            ]
        })))
        .mount(&server)
        .await;

    let api = api_for(&server.uri());
    let recipes = api.fetch_recipes().await.unwrap();

    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0].id.as_str(), "r1");
    assert_eq!(recipes[0].instructions.len(), 2);
    assert_eq!(recipes[0].origin, Origin::Remote);
    assert_eq!(recipes[1].name, "Salad");
}

#[tokio::test]
async fn fetch_recipes_surfaces_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let api = api_for(&server.uri());
    let result = api.fetch_recipes().await;
    assert!(matches!(result, Err(NetworkError::Decoding(_))));
}

#[tokio::test]
async fn set_liked_puts_absolute_value() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/recipes/r1/like"))
        .and(body_json(json!({"liked": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server.uri());
    api.set_liked(&RecipeId::new("r1"), true).await.unwrap();
}

#[tokio::test]
async fn set_liked_rejects_empty_id_without_a_request() {
    let server = MockServer::start().await;
    let api = api_for(&server.uri());

    let result = api.set_liked(&RecipeId::new(""), true).await;

    assert!(matches!(result, Err(NetworkError::InvalidInput(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn like_counts_posts_batch_and_maps_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recipes/likes"))
        .and(body_json(json!({"ids": ["r1", "r2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "counts": [
                {"recipe_id": "r1", "liked": true, "count": 3},
                {"recipe_id": "r2", "liked": false, "count": 0}
            ]
        })))
        .mount(&server)
        .await;

    let api = api_for(&server.uri());
    let counts = api
        .like_counts(&[RecipeId::new("r1"), RecipeId::new("r2")])
        .await
        .unwrap();

    assert_eq!(counts.len(), 2);
    assert!(counts[0].liked);
    assert_eq!(counts[0].count, 3);
    assert_eq!(counts[1].recipe_id.as_str(), "r2");
}

#[tokio::test]
async fn like_counts_skips_the_network_for_an_empty_batch() {
    let server = MockServer::start().await;
    let api = api_for(&server.uri());

    let counts = api.like_counts(&[]).await.unwrap();

    assert!(counts.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
