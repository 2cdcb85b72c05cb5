//! Input validation for account fields and source URLs
//!
//! Every check here runs before any network or database I/O.

use crate::utils::error::TubevaultError;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

/// Known public YouTube link shapes: canonical watch link, legacy player
/// link, short link, and embed link. Anything else is rejected before a
/// network call is ever attempted.
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://(?:www\.)?youtube\.com/watch\?v=[\w-]+",
        r"^https?://(?:www\.)?youtube\.com/v/[\w-]+",
        r"^https?://youtu\.be/[\w-]+",
        r"^https?://(?:www\.)?youtube\.com/embed/[\w-]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("url pattern"))
    .collect()
});

/// Username: at least 3 characters, alphanumeric only.
pub fn validate_username(username: &str) -> Result<(), TubevaultError> {
    if username.chars().count() < 3 {
        return Err(TubevaultError::Validation(
            "username must be at least 3 characters".into(),
        ));
    }
    if !username.chars().all(|c| c.is_alphanumeric()) {
        return Err(TubevaultError::Validation(
            "username may only contain letters and digits".into(),
        ));
    }
    Ok(())
}

/// Password: at least 8 characters with one uppercase letter, one
/// lowercase letter and one digit.
pub fn validate_password(password: &str) -> Result<(), TubevaultError> {
    if password.chars().count() < 8 {
        return Err(TubevaultError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(TubevaultError::Validation(
            "password must contain an uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(TubevaultError::Validation(
            "password must contain a lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(TubevaultError::Validation(
            "password must contain a digit".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), TubevaultError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(TubevaultError::Validation(
            "email address is not valid".into(),
        ))
    }
}

/// Check whether a URL matches one of the accepted link shapes.
pub fn is_valid_media_url(url: &str) -> bool {
    URL_PATTERNS.iter().any(|p| p.is_match(url))
}

pub fn validate_media_url(url: &str) -> Result<(), TubevaultError> {
    if is_valid_media_url(url) {
        Ok(())
    } else {
        Err(TubevaultError::Validation(
            "URL is not a recognized YouTube link".into(),
        ))
    }
}
