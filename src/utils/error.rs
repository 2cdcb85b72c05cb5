//! Error handling for Tubevault

use thiserror::Error;

/// Main error type for Tubevault
///
/// Validation failures are caught before any I/O; auth and download
/// failures are terminal for the operation and never retried.
#[derive(Debug, Error)]
pub enum TubevaultError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("no account exists with that username")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("username or email is already registered")]
    DuplicateIdentity,

    #[error("no user is logged in")]
    NotAuthenticated,

    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("could not resolve media metadata for {0}")]
    MetadataUnavailable(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("a download is already in progress")]
    DownloadInProgress,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
