//! Extraction capability: metadata resolution and byte transfer

pub mod models;
pub mod traits;
pub mod ytdlp;

pub use models::{DownloadProfile, MediaInfo};
pub use traits::MediaExtractor;
pub use ytdlp::YtDlpExtractor;
