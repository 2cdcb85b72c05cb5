use crate::extractor::models::{DownloadProfile, MediaInfo};
use crate::utils::error::TubevaultError;
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

/// The external extraction/download capability, consumed as an opaque
/// interface: given a URL and a profile, produce metadata, progress
/// percentages and a completion status.
///
/// The trait seam keeps the download worker testable without spawning
/// yt-dlp.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve source metadata without downloading.
    async fn probe(&self, url: &str) -> Result<MediaInfo, TubevaultError>;

    /// Transfer bytes to disk under `output_template`, reporting progress
    /// percentages in `[0.0, 100.0]` on `progress` as they become known.
    /// Updates may be sparse or absent when the total size is unknown.
    async fn download(
        &self,
        url: &str,
        output_template: &Path,
        profile: &DownloadProfile,
        progress: mpsc::Sender<f64>,
    ) -> Result<(), TubevaultError>;
}
