//! Download history persistence, scoped to an owning account

use crate::utils::error::TubevaultError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Media kind of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Extension of the file the delegation profile produces.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = TubevaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(TubevaultError::Validation(format!(
                "unknown media kind: {other}"
            ))),
        }
    }
}

/// One completed download owned by an account
#[derive(Debug, Clone, Serialize)]
pub struct DownloadRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub file_path: PathBuf,
    pub kind: MediaKind,
    pub download_date: DateTime<Utc>,
}

/// Per-owner download counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: i64,
    pub video_count: i64,
    pub audio_count: i64,
}

/// History store backed by the shared SQLite pool
#[derive(Clone)]
pub struct HistoryStore {
    pool: Pool<Sqlite>,
}

impl HistoryStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Append one completed-download record and return its id.
    pub async fn add_record(
        &self,
        owner_id: i64,
        title: &str,
        url: &str,
        file_path: &Path,
        kind: MediaKind,
    ) -> Result<i64, TubevaultError> {
        let result = sqlx::query(
            r#"
            INSERT INTO downloads (user_id, title, url, file_path, file_type, download_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(url)
        .bind(file_path.to_string_lossy().into_owned())
        .bind(kind.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(owner_id, id, title, "saved download record");
        Ok(id)
    }

    /// All records for an owner, newest first. An owner with no records
    /// gets an empty list, not an error.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<DownloadRecord>, TubevaultError> {
        let rows = sqlx::query(
            "SELECT * FROM downloads WHERE user_id = ? ORDER BY download_date DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(row_into_record(row)?);
        }
        Ok(records)
    }

    /// Delete a record only if it belongs to `owner_id`.
    ///
    /// Returns whether a row was actually removed; a missing or
    /// foreign-owned id is `false`, not an error.
    pub async fn delete_record(
        &self,
        record_id: i64,
        owner_id: i64,
    ) -> Result<bool, TubevaultError> {
        let result = sqlx::query("DELETE FROM downloads WHERE id = ? AND user_id = ?")
            .bind(record_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        debug!(record_id, owner_id, removed, "delete download record");
        Ok(removed)
    }

    /// Aggregate counts for an owner. All zero when the owner has no
    /// records — absence of data is not a failure.
    pub async fn stats_by_owner(&self, owner_id: i64) -> Result<DownloadStats, TubevaultError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(CASE WHEN file_type = 'video' THEN 1 END) AS video_count,
                COUNT(CASE WHEN file_type = 'audio' THEN 1 END) AS audio_count
            FROM downloads
            WHERE user_id = ?
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DownloadStats {
            total: row.get("total"),
            video_count: row.get("video_count"),
            audio_count: row.get("audio_count"),
        })
    }
}

/// Convert database row to download record
fn row_into_record(row: sqlx::sqlite::SqliteRow) -> Result<DownloadRecord, TubevaultError> {
    Ok(DownloadRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        url: row.get("url"),
        file_path: PathBuf::from(row.get::<&str, _>("file_path")),
        kind: row.get::<&str, _>("file_type").parse()?,
        download_date: row.get("download_date"),
    })
}
