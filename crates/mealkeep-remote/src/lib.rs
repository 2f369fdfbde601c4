pub mod api;
pub mod client;
pub mod wire;

pub use api::RecipeApi;
pub use client::{
    DEFAULT_BASE_URL, RemoteClient, RemoteConfig, SecretStore, StaticSecrets, resolve_base_url,
};
