//! Upload filename sanitizing and deduplication

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-.]").expect("Invalid regex"));

/// Length of the token inserted into every stored filename
pub const DEDUP_TOKEN_LEN: usize = 8;

/// Replaces every character other than letters, digits, `_`, `-` and `.` with `_`
#[must_use]
pub fn sanitize(filename: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(filename, "_").into_owned()
}

/// Inserts `_{token}` before the last extension, or appends it when there is none
#[must_use]
pub fn with_token(safe_filename: &str, token: &str) -> String {
    match safe_filename.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}_{token}.{extension}"),
        None => format!("{safe_filename}_{token}"),
    }
}

/// Fresh 8 character hex token
#[must_use]
pub fn dedup_token() -> String {
    Uuid::new_v4().simple().to_string()[..DEDUP_TOKEN_LEN].to_string()
}

/// Name used when the client does not supply one
#[must_use]
pub fn generated_filename() -> String {
    format!("image-{}.jpg", Uuid::new_v4())
}

/// Sanitized filename with a fresh deduplication token
#[must_use]
pub fn storage_filename(original: &str) -> String {
    with_token(&sanitize(original), &dedup_token())
}
