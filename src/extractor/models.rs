//! Data structures for resolved media information

use crate::database::MediaKind;
use serde::{Deserialize, Serialize};

/// Metadata resolved for a source URL before any bytes are transferred.
/// Deserialized from yt-dlp's `--dump-json` output; unknown fields are
/// ignored and missing ones default so partial records still parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    #[serde(alias = "webpage_url")]
    pub url: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(alias = "filesize_approx")]
    pub filesize: Option<u64>,
    pub extractor: Option<String>,
}

impl MediaInfo {
    /// Whether the resolution produced enough to proceed with a download.
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// One of the two fixed delegation profiles passed to the extraction
/// capability. The format expressions are opaque configuration; they are
/// not interpreted by this system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadProfile {
    /// Best available combined video+audio, mp4 preferred
    Video,
    /// Best available audio, transcoded to fixed-bitrate mp3
    Audio { bitrate_kbps: u32 },
}

impl DownloadProfile {
    pub fn for_kind(kind: MediaKind, audio_bitrate_kbps: u32) -> Self {
        match kind {
            MediaKind::Video => DownloadProfile::Video,
            MediaKind::Audio => DownloadProfile::Audio {
                bitrate_kbps: audio_bitrate_kbps,
            },
        }
    }

    /// yt-dlp arguments selecting this profile.
    pub fn format_args(&self) -> Vec<String> {
        match self {
            DownloadProfile::Video => vec![
                "-f".into(),
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".into(),
            ],
            DownloadProfile::Audio { bitrate_kbps } => vec![
                "-f".into(),
                "bestaudio/best".into(),
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                format!("{bitrate_kbps}K"),
            ],
        }
    }
}
