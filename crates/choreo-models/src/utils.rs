//! Identifier validation shared by the storage and API crates.
//!
//! User ids and filenames end up as path components on disk, so anything
//! that arrives from a request is checked here before a path is built.

/// User id assumed when an upload or listing omits one.
pub const DEFAULT_USER_ID: &str = "default_user";

/// Maximum accepted length for user ids and stored filenames.
pub const MAX_ID_LEN: usize = 128;

/// Check that a user id is safe to use as a directory name.
///
/// Accepts 1..=128 ASCII alphanumerics, `_` and `-`.
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check that a filename refers to a single entry inside a directory.
///
/// Like [`is_valid_user_id`] but also allows `.`; rejects `..` anywhere and
/// any leading dot.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ID_LEN
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
