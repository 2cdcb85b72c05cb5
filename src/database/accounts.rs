//! Account persistence and credential checks
//!
//! Passwords are stored only as bcrypt hashes. Verification goes through
//! bcrypt's own check, which is constant-time by construction — stored
//! hashes are never compared with naive byte equality.

use crate::utils::error::TubevaultError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, warn};

/// A registered account, as exposed to the rest of the application.
/// The password hash deliberately never leaves this module.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Account store backed by the shared SQLite pool
#[derive(Clone)]
pub struct AccountStore {
    pool: Pool<Sqlite>,
    hash_cost: u32,
}

impl AccountStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lowered hash cost for tests; production code uses `new`.
    pub fn with_cost(pool: Pool<Sqlite>, hash_cost: u32) -> Self {
        Self { pool, hash_cost }
    }

    /// Register a new account.
    ///
    /// Uniqueness of username and email is enforced by the database in a
    /// single insert, so there is no check-then-act window.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Account, TubevaultError> {
        let hash = hash_password(password.to_string(), self.hash_cost).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&hash)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                warn!(username, "registration rejected: identity already taken");
                return Err(TubevaultError::DuplicateIdentity);
            }
            Err(e) => return Err(e.into()),
        };

        let id = result.last_insert_rowid();
        debug!(username, id, "account registered");

        self.fetch_account(id).await
    }

    /// Authenticate by username and password.
    ///
    /// `NotFound` when the username is unknown, `InvalidCredential` when
    /// the password does not verify against the stored hash.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Account, TubevaultError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(TubevaultError::NotFound);
        };

        let stored: String = row.get("password_hash");
        if !verify_password(password.to_string(), stored).await? {
            warn!(username, "login rejected: password mismatch");
            return Err(TubevaultError::InvalidCredential);
        }

        debug!(username, "login accepted");
        Ok(Account {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        })
    }

    /// Replace the stored hash after verifying the old password.
    pub async fn change_password(
        &self,
        account_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), TubevaultError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Err(TubevaultError::NotFound);
        };

        let stored: String = row.get("password_hash");
        if !verify_password(old_password.to_string(), stored).await? {
            return Err(TubevaultError::InvalidCredential);
        }

        let hash = hash_password(new_password.to_string(), self.hash_cost).await?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&hash)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        debug!(account_id, "password changed");
        Ok(())
    }

    async fn fetch_account(&self, id: i64) -> Result<Account, TubevaultError> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Account {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            created_at: row.get("created_at"),
        })
    }
}

/// bcrypt is deliberately slow; keep it off the async worker threads.
async fn hash_password(password: String, cost: u32) -> Result<String, TubevaultError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

async fn verify_password(password: String, hash: String) -> Result<bool, TubevaultError> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}
