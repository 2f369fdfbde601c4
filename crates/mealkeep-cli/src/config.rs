use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration. Everything is optional; env
/// variables override the file and hard-coded defaults cover the rest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub device_id: Option<String>,
}

/// Config file path: `~/.config/mealkeep/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mealkeep").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        if let Ok(config) = toml::from_str::<AppConfig>(&contents) {
            return config;
        }
        eprintln!(
            "warning: failed to parse config at {}, using defaults",
            path.display()
        );
    }

    AppConfig::default()
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    let Some(path) = config_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).map_err(std::io::Error::other)?;
    std::fs::write(&path, contents)
}

/// The device identifier sent with every request. Generated once and
/// persisted; a config that cannot be written just gets a fresh id per
/// run.
pub fn ensure_device_id(config: &mut AppConfig) -> String {
    if let Some(device_id) = &config.device_id {
        return device_id.clone();
    }
    let device_id = uuid::Uuid::new_v4().to_string();
    config.device_id = Some(device_id.clone());
    if let Err(error) = save_config(config) {
        eprintln!("warning: could not persist device id: {error}");
    }
    device_id
}

/// Runtime env beats the config file for the API base URL; the remote
/// crate applies the build-time setting and default after this.
pub fn api_url_override(config: &AppConfig) -> Option<String> {
    std::env::var("MEALKEEP_API_URL")
        .ok()
        .or_else(|| config.api_url.clone())
}

pub fn api_key(config: &AppConfig) -> Option<String> {
    std::env::var("MEALKEEP_API_KEY")
        .ok()
        .or_else(|| config.api_key.clone())
}

pub fn bearer_token() -> Option<String> {
    std::env::var("MEALKEEP_BEARER_TOKEN").ok()
}
