//! Data directory layout.
//!
//! Everything the memory core writes lives under one directory: the SQLite
//! database, `config.toml`, and CLI exports.

use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "SOMA_DATA_DIR";

/// Resolve the data directory.
///
/// Priority:
/// 1. `SOMA_DATA_DIR` environment variable
/// 2. `~/.soma`
/// 3. `.soma` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    resolve_data_dir_with(std::env::var(ENV_DATA_DIR).ok(), dirs::home_dir())
}

fn resolve_data_dir_with(env_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    match home {
        Some(home) => home.join(".soma"),
        None => PathBuf::from(".soma"),
    }
}

/// Default directory for `soma export`.
pub fn exports_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("exports")
}
