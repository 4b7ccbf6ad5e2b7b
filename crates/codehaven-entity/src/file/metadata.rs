//! File metadata block.

use serde::{Deserialize, Serialize};

/// Editor-facing metadata stored on each file record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Detected language, if any.
    #[serde(default)]
    pub language: Option<String>,
    /// Content encoding.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Line count for text-like content, computed at write time.
    #[serde(default)]
    pub line_count: Option<i64>,
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self {
            language: None,
            encoding: default_encoding(),
            line_count: None,
        }
    }
}

fn default_encoding() -> String {
    "utf-8".to_string()
}
