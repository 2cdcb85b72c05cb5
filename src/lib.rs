//! Tubevault library

pub mod app;
pub mod database;
pub mod downloader;
pub mod extractor;
pub mod utils;

// Re-export main types for easier use
pub use app::{App, DownloadUpdate, Screen, Session};
pub use database::{
    Account, AccountStore, DownloadRecord, DownloadStats, HistoryStore, MediaKind,
};
pub use downloader::{DownloadRequest, DownloadWorker, WorkerEvent, WorkerHandle, WorkerState};
pub use extractor::{DownloadProfile, MediaExtractor, MediaInfo, YtDlpExtractor};
pub use utils::{AppSettings, TubevaultError};
