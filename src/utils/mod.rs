//! Utility modules for error handling, configuration and validation

pub mod config;
pub mod error;
pub mod files;
pub mod validators;

// Re-export for convenience
pub use config::AppSettings;
pub use error::TubevaultError;
