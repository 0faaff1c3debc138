//! Configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.soma/` by default) into
//! [`MemoryConfig`], then applies environment overrides. A missing or
//! malformed file yields the defaults.

use std::path::Path;

use soma_types::config::MemoryConfig;

pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_CHAT_MODEL: &str = "SOMA_CHAT_MODEL";
pub const ENV_VISION_MODEL: &str = "SOMA_VISION_MODEL";
pub const ENV_OLLAMA_URL: &str = "SOMA_OLLAMA_URL";

/// Load `{data_dir}/config.toml` and apply environment overrides.
pub async fn load_config(data_dir: &Path) -> MemoryConfig {
    let mut config = read_config_file(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

async fn read_config_file(data_dir: &Path) -> MemoryConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return MemoryConfig::default();
        }
    };

    match toml::from_str::<MemoryConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            MemoryConfig::default()
        }
    }
}

/// Override backend settings from the environment. Empty values are ignored.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
pub fn apply_env_overrides(config: &mut MemoryConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(model) = get(ENV_CHAT_MODEL) {
        config.llm.chat_model = model;
    }
    if let Some(model) = get(ENV_VISION_MODEL) {
        config.llm.vision_model = model;
    }
    if let Some(url) = get(ENV_OLLAMA_URL) {
        config.llm.base_url = url;
    }
}
