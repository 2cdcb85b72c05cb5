//! Database module

pub mod accounts;
pub mod history;
pub mod schema;

// Re-export for convenience
pub use accounts::{Account, AccountStore};
pub use history::{DownloadRecord, DownloadStats, HistoryStore, MediaKind};
pub use schema::{create_tables, initialize_database};
