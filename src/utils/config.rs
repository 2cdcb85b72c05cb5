//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Directory completed downloads are written to
    pub download_dir: PathBuf,

    /// SQLite database file location
    pub database_path: PathBuf,

    /// Bitrate for the audio (mp3) delegation profile
    pub audio_bitrate_kbps: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let download_dir = dirs::download_dir()
            .unwrap_or_else(|| PathBuf::from("./downloads"))
            .join("TubeVault");
        let database_path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubevault")
            .join("tubevault.db");

        Self {
            download_dir,
            database_path,
            audio_bitrate_kbps: 192,
        }
    }
}

impl AppSettings {
    /// sqlx connection URL for the configured database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path.display())
    }
}
