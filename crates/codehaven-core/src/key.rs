//! Blob store key derivation.
//!
//! A file's blob key is a pure function of its workspace, folder path,
//! and file name: `workspaces/{workspace_id}/{folder_path}/{file_name}`
//! with repeated separators collapsed. Folder paths are unique per
//! workspace and file names unique per folder, so distinct files always
//! derive distinct keys.

use uuid::Uuid;

/// Name of the marker object written when a workspace is created.
pub const WORKSPACE_MARKER: &str = ".workspace";

/// Name of the marker object written when a folder is created.
pub const FOLDER_MARKER: &str = ".folder";

/// The blob key prefix owned by a workspace, with a trailing separator.
pub fn workspace_prefix(workspace_id: Uuid) -> String {
    format!("workspaces/{workspace_id}/")
}

/// Derive the blob key for a file.
pub fn derive_key(workspace_id: Uuid, folder_path: &str, file_name: &str) -> String {
    collapse_separators(&format!(
        "workspaces/{workspace_id}/{folder_path}/{file_name}"
    ))
}

/// Derive the blob key for the object stored at a full metadata path
/// (a file's `path` column already contains the file name).
pub fn key_for_path(workspace_id: Uuid, path: &str) -> String {
    collapse_separators(&format!("workspaces/{workspace_id}/{path}"))
}

/// The key of a workspace's init marker object.
pub fn workspace_marker_key(workspace_id: Uuid) -> String {
    format!("{}{WORKSPACE_MARKER}", workspace_prefix(workspace_id))
}

/// The key of a folder's marker object.
pub fn folder_marker_key(workspace_id: Uuid, folder_path: &str) -> String {
    derive_key(workspace_id, folder_path, FOLDER_MARKER)
}

/// Whether a key names one of the internal marker objects.
pub fn is_marker_key(key: &str) -> bool {
    key.ends_with(&format!("/{WORKSPACE_MARKER}")) || key.ends_with(&format!("/{FOLDER_MARKER}"))
}

fn collapse_separators(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_slash = false;
    for c in raw.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}
