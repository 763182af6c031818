mod config;
pub mod database;

pub use config::{Config, DisplayConfig, SyncConfig};
pub use database::SqliteSink;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory.
///
/// `ORIENTEERING_DATA_DIR` wins when set; otherwise `~/.config/orienteering`,
/// or `~/.config/orienteering-dev` when `ORIENTEERING_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("ORIENTEERING_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ORIENTEERING_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("orienteering-dev")
            } else {
                base_dir.join("orienteering")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
