//! Database schema

use crate::utils::error::TubevaultError;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::{debug, info};

/// Initialize the database
///
/// A failure here is the only fatal startup condition; every later
/// storage error is surfaced to the caller and the process keeps running.
pub async fn initialize_database(db_url: &str) -> Result<Pool<Sqlite>, TubevaultError> {
    // Create database if it doesn't exist
    if !Sqlite::database_exists(db_url).await? {
        debug!("Creating database at: {}", db_url);
        Sqlite::create_database(db_url).await?;
    }

    // Connect to the database
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(db_url)
        .await?;

    // Run migrations
    info!("Running database migrations");
    create_tables(&pool).await?;

    Ok(pool)
}

/// Create database tables
pub async fn create_tables(pool: &Pool<Sqlite>) -> Result<(), TubevaultError> {
    // Accounts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Completed downloads table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS downloads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_type TEXT NOT NULL CHECK (file_type IN ('video', 'audio')),
            download_date DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_downloads_user ON downloads(user_id)")
        .execute(pool)
        .await?;

    debug!("Database tables created successfully");
    Ok(())
}
