//! yt-dlp wrapper implementing the extraction capability
//!
//! Metadata resolution uses `yt-dlp --dump-json --no-download`; transfers
//! run yt-dlp with `--newline` and parse progress percentages from its
//! stdout lines.

use crate::extractor::models::{DownloadProfile, MediaInfo};
use crate::extractor::traits::MediaExtractor;
use crate::utils::error::TubevaultError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Extraction capability backed by a yt-dlp binary
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and fail with `YtDlpNotFound` when it is missing.
    pub fn new() -> Result<Self, TubevaultError> {
        let ytdlp_path = match find_ytdlp() {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere");
                return Err(TubevaultError::YtDlpNotFound);
            }
        };

        Ok(Self { ytdlp_path })
    }

    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn probe(&self, url: &str) -> Result<MediaInfo, TubevaultError> {
        debug!("Resolving metadata for URL: {}", url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("yt-dlp metadata resolution failed: {}", stderr.trim());
            return Err(TubevaultError::MetadataUnavailable(url.to_string()));
        }

        let info: MediaInfo = match serde_json::from_slice(&output.stdout) {
            Ok(info) => info,
            Err(e) => {
                warn!("unparsable yt-dlp metadata: {}", e);
                return Err(TubevaultError::MetadataUnavailable(url.to_string()));
            }
        };

        Ok(info)
    }

    async fn download(
        &self,
        url: &str,
        output_template: &Path,
        profile: &DownloadProfile,
        progress: mpsc::Sender<f64>,
    ) -> Result<(), TubevaultError> {
        debug!("Starting yt-dlp transfer for URL: {}", url);

        let mut cmd = AsyncCommand::new(&self.ytdlp_path);
        cmd.arg("--newline")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .args(profile.format_args())
            .arg("-o")
            .arg(output_template)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        // stderr is drained concurrently so the pipe never fills; the last
        // lines become the failure reason on a non-zero exit.
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            if let Some(stream) = stderr {
                let mut lines = BufReader::new(stream).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("yt-dlp stderr: {}", line);
                    tail.push(line);
                    if tail.len() > 20 {
                        tail.remove(0);
                    }
                }
            }
            tail
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(percent) = parse_progress_percent(&line) {
                    let _ = progress.send(percent).await;
                }
            }
        }

        let status = child.wait().await?;
        let tail = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            let reason = if tail.is_empty() {
                format!("yt-dlp exited with {status}")
            } else {
                tail.join("\n")
            };
            error!("yt-dlp transfer failed: {}", reason);
            Err(TubevaultError::Download(reason))
        }
    }
}

/// Parse the percentage out of a `[download]  42.7% of ...` line.
fn parse_progress_percent(line: &str) -> Option<f64> {
    if !line.trim_start().starts_with("[download]") {
        return None;
    }
    let idx = line.find('%')?;
    let prefix = &line[..idx];
    let start = prefix.rfind(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    prefix[start + 1..].trim().parse::<f64>().ok()
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp on the PATH or in common installation locations.
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(common) = find_in_common_paths() {
        return Some(common);
    }

    warn!("yt-dlp not found on PATH or in common locations");
    None
}

fn find_in_common_paths() -> Option<PathBuf> {
    let common_paths = [
        // macOS Homebrew (Apple Silicon)
        "/opt/homebrew/bin/yt-dlp",
        // macOS Homebrew (Intel) / Linux local
        "/usr/local/bin/yt-dlp",
        // System
        "/usr/bin/yt-dlp",
        // pip user install
        "~/.local/bin/yt-dlp",
    ];

    for path_str in common_paths {
        let expanded = if let Some(rest) = path_str.strip_prefix("~/") {
            dirs::home_dir().map(|home| home.join(rest))?
        } else {
            PathBuf::from(path_str)
        };

        if expanded.exists() && is_executable(&expanded) {
            return Some(expanded);
        }
    }

    None
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = std::fs::metadata(path) {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_lines() {
        assert_eq!(
            parse_progress_percent("[download]  42.7% of 10.00MiB at 1.00MiB/s ETA 00:05"),
            Some(42.7)
        );
        assert_eq!(
            parse_progress_percent("[download] 100% of 10.00MiB in 00:10"),
            Some(100.0)
        );
        assert_eq!(parse_progress_percent("[download]   0.0% of ~3.50MiB"), Some(0.0));
    }

    #[test]
    fn test_parse_ignores_non_progress_lines() {
        assert_eq!(parse_progress_percent("[info] abc123: Downloading 1 format(s)"), None);
        assert_eq!(parse_progress_percent("[download] Destination: video.mp4"), None);
        assert_eq!(parse_progress_percent(""), None);
    }

    #[test]
    fn test_find_ytdlp() {
        // Don't assert - yt-dlp might not be installed in CI
        let result = find_ytdlp();
        println!("yt-dlp found at: {:?}", result);
    }
}
