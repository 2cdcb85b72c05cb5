//! Filesystem helpers for download destinations

use std::path::{Path, PathBuf};

/// Longest media extension we append (".mp4" / ".mp3"), reserved when
/// truncating so the full filename stays within common filesystem limits.
const EXTENSION_RESERVE: usize = 4;
const MAX_FILENAME_BYTES: usize = 255;

/// Build a safe filename stem from a resolved media title.
///
/// Characters illegal on common filesystems are stripped, spaces become
/// underscores, and the result is truncated (on a char boundary) so that
/// appending a media extension keeps the name under the 255-byte limit.
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let budget = MAX_FILENAME_BYTES - EXTENSION_RESERVE;

    for c in title.chars() {
        let c = match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => continue,
            ' ' => '_',
            other => other,
        };
        if out.len() + c.len_utf8() > budget {
            break;
        }
        out.push(c);
    }

    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}

/// Create the directory (and parents) if it does not exist.
pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Find a filename that does not collide with an existing file by
/// appending `_1`, `_2`, ... to the stem.
pub fn available_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((s, e)) => (s.to_string(), format!(".{e}")),
        None => (filename.to_string(), String::new()),
    };

    let mut counter = 1u32;
    loop {
        let next = dir.join(format!("{stem}_{counter}{ext}"));
        if !next.exists() {
            return next;
        }
        counter += 1;
    }
}

/// Human-readable file size for history listings.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
