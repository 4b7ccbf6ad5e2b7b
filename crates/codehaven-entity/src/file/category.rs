//! Static extension → category and extension → MIME mapping tables.

use serde::{Deserialize, Serialize};

/// Broad language/category bucket derived from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FileCategory {
    Javascript,
    Typescript,
    Python,
    Html,
    Css,
    Scss,
    Sass,
    Json,
    Xml,
    Yaml,
    Markdown,
    Text,
    Shell,
    Dockerfile,
    Sql,
    Php,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    Ruby,
    Other,
}

impl FileCategory {
    /// Map a (lowercased) extension to its category. Unknown extensions
    /// fall back to [`FileCategory::Other`].
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" => Self::Javascript,
            "ts" | "tsx" => Self::Typescript,
            "py" => Self::Python,
            "html" | "htm" => Self::Html,
            "css" => Self::Css,
            "scss" => Self::Scss,
            "sass" => Self::Sass,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "yaml" | "yml" => Self::Yaml,
            "md" => Self::Markdown,
            "txt" => Self::Text,
            "sh" => Self::Shell,
            "dockerfile" => Self::Dockerfile,
            "sql" => Self::Sql,
            "php" => Self::Php,
            "java" => Self::Java,
            "cpp" | "cc" | "cxx" => Self::Cpp,
            "c" | "h" => Self::C,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "rb" => Self::Ruby,
            _ => Self::Other,
        }
    }

    /// Lowercase string form, matching what is stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Python => "python",
            Self::Html => "html",
            Self::Css => "css",
            Self::Scss => "scss",
            Self::Sass => "sass",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Shell => "shell",
            Self::Dockerfile => "dockerfile",
            Self::Sql => "sql",
            Self::Php => "php",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Other => "other",
        }
    }

    /// Categories whose content gets a line count computed at write time.
    pub fn counts_lines(&self) -> bool {
        matches!(
            self,
            Self::Javascript | Self::Typescript | Self::Python | Self::Html | Self::Css
        )
    }
}

/// Map a (lowercased) extension to a MIME type. Unknown extensions fall
/// back to `text/plain`.
pub fn mime_type_for(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "js" | "jsx" | "mjs" => "application/javascript",
        "ts" | "tsx" => "application/typescript",
        "py" => "text/x-python",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "scss" => "text/x-scss",
        "sass" => "text/x-sass",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/x-yaml",
        "md" => "text/markdown",
        "txt" => "text/plain",
        "sh" => "text/x-shellscript",
        "sql" => "application/sql",
        _ => "text/plain",
    }
}
