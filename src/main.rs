//! Tubevault - per-account YouTube downloader
//!
//! Headless front end over the tubevault library: accounts, downloads and
//! the per-account download history live in a local SQLite database, while
//! the actual extraction and transfer are delegated to yt-dlp.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tubevault::utils::files;
use tubevault::{App, AppSettings, DownloadUpdate, MediaExtractor, MediaKind, YtDlpExtractor};

#[derive(Parser)]
#[command(name = "tubevault", about = "Download YouTube media with a per-account history")]
struct Cli {
    /// Override the downloads directory
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Override the database file location
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
    },
    /// Download a video or audio track and record it in your history
    Download {
        url: String,
        /// Media kind: video (combined) or audio (mp3)
        #[arg(long, default_value = "video")]
        kind: MediaKind,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// List your completed downloads, newest first
    History {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Show download counts by media kind
    Stats {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Delete one of your history records
    Delete {
        record_id: i64,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Change your password
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        new_password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut settings = AppSettings::default();
    if let Some(dir) = cli.download_dir {
        settings.download_dir = dir;
    }
    if let Some(db) = cli.database {
        settings.database_path = db;
    }

    if let Some(parent) = settings.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            files::ensure_dir(parent).context("creating database directory")?;
        }
    }

    // Storage initialization failure is the only fatal startup error.
    let pool = tubevault::database::initialize_database(&settings.database_url())
        .await
        .context("initializing database")?;

    // Missing yt-dlp is not fatal here; account and history commands still
    // work, and a download attempt reports the problem.
    let extractor: Option<Arc<dyn MediaExtractor>> = match YtDlpExtractor::new() {
        Ok(e) => Some(Arc::new(e)),
        Err(e) => {
            warn!("{e}; downloads will fail until yt-dlp is installed");
            None
        }
    };

    let mut app = App::new(pool, extractor, settings);

    match cli.command {
        Command::Register {
            username,
            password,
            email,
        } => {
            let account = app.register_account(&username, &password, &email).await?;
            println!("Account '{}' created. You can now log in.", account.username);
        }
        Command::Download {
            url,
            kind,
            username,
            password,
        } => {
            app.login(&username, &password).await?;
            run_download(&app, &url, kind).await?;
        }
        Command::History { username, password } => {
            app.login(&username, &password).await?;
            let records = app.history().await?;
            if records.is_empty() {
                println!("No downloads yet.");
            }
            for record in records {
                let size = std::fs::metadata(&record.file_path)
                    .map(|m| files::human_size(m.len()))
                    .unwrap_or_else(|_| "missing".to_string());
                println!(
                    "#{:<5} {} [{}] {} ({}) -> {}",
                    record.id,
                    record.download_date.format("%Y-%m-%d %H:%M"),
                    record.kind,
                    record.title,
                    size,
                    record.file_path.display()
                );
            }
        }
        Command::Stats { username, password } => {
            app.login(&username, &password).await?;
            let stats = app.stats().await?;
            println!(
                "{} downloads total ({} video, {} audio)",
                stats.total, stats.video_count, stats.audio_count
            );
        }
        Command::Delete {
            record_id,
            username,
            password,
        } => {
            app.login(&username, &password).await?;
            if app.delete_history_record(record_id).await? {
                println!("Record {record_id} deleted.");
            } else {
                println!("Record {record_id} not found in your history.");
            }
        }
        Command::ChangePassword {
            username,
            password,
            new_password,
        } => {
            app.login(&username, &password).await?;
            app.change_password(&password, &new_password).await?;
            println!("Password changed.");
        }
    }

    Ok(())
}

async fn run_download(app: &App, url: &str, kind: MediaKind) -> Result<()> {
    let mut updates = app.start_download(url, kind)?;

    while let Some(update) = updates.recv().await {
        match update {
            DownloadUpdate::Metadata(info) => {
                println!("Title: {}", info.title);
                if let Some(uploader) = &info.uploader {
                    println!("Uploader: {uploader}");
                }
            }
            DownloadUpdate::Progress(percent) => {
                println!("Progress: {percent:.1}%");
            }
            DownloadUpdate::Completed {
                record_id,
                output_path,
            } => {
                println!("Saved to {} (history record #{record_id})", output_path.display());
                return Ok(());
            }
            DownloadUpdate::Failed { reason } => {
                return Err(anyhow!("download failed: {reason}"));
            }
        }
    }

    Err(anyhow!("download ended without a result"))
}
