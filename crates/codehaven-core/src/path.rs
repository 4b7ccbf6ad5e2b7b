//! Materialized path resolution and name validation.
//!
//! Every folder and file stores its full path as a denormalized string.
//! A root entry in a workspace lives at `/{name}`; a nested entry at
//! `{parent_path}/{name}`. These helpers are pure — resolving a parent
//! id to a live folder is the repository's job.

use crate::error::AppError;
use crate::result::AppResult;

/// Characters that may not appear in folder or file names.
pub const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum length of a single folder or file name.
pub const MAX_NAME_LEN: usize = 255;

/// Validate a candidate folder or file name and return it trimmed.
pub fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_name("Name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::invalid_name(format!(
            "Name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if let Some(bad) = trimmed.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(AppError::invalid_name(format!(
            "Name contains forbidden character '{bad}'"
        )));
    }
    Ok(trimmed.to_string())
}

/// Compute the full path of an entry under an optional parent path.
///
/// `None` means the entry sits at the workspace root.
pub fn resolve(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) => format!("{parent}/{name}"),
        None => format!("/{name}"),
    }
}

/// Return the parent path of a path, or `None` for root-level entries.
pub fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

/// Return the final segment of a path.
pub fn leaf_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Rewrite `path` from `old_prefix` to `new_prefix`.
///
/// Only rewrites whole-segment prefixes: `/a` rebases `/a` itself and
/// `/a/...`, but never `/ab/...`. Returns `None` when `path` is not
/// under `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if path == old_prefix {
        return Some(new_prefix.to_string());
    }
    let rest = path.strip_prefix(old_prefix)?;
    if !rest.starts_with('/') {
        return None;
    }
    Some(format!("{new_prefix}{rest}"))
}

/// Split a full file name into its stem and lowercased extension.
///
/// Names without a dot (or starting with one, like `.gitignore`) have an
/// empty extension.
pub fn split_file_name(file_name: &str) -> (String, String) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (
            file_name[..idx].to_string(),
            file_name[idx + 1..].to_lowercase(),
        ),
        _ => (file_name.to_string(), String::new()),
    }
}
