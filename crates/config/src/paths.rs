//! Data path utilities

use std::path::{Path, PathBuf};

/// Data directory (~/.toolbridge)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".toolbridge"))
        .unwrap_or_else(|| PathBuf::from(".toolbridge"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
