//! Content type identification and detection
//!
//! Maps file extensions to content types and their canonical mime types.
//! Files are grouped for cross-file symbol search by canonical mime type.

use std::path::Path;

/// Known content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    #[default]
    PlainText,
    JavaScript,
    Css,
    Html,
    Json,
    TypeScript,
}

impl ContentType {
    /// Detect content type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => ContentType::JavaScript,
            "css" => ContentType::Css,
            "html" | "htm" => ContentType::Html,
            "json" | "map" => ContentType::Json,
            "ts" | "mts" | "cts" | "tsx" => ContentType::TypeScript,
            _ => ContentType::PlainText,
        }
    }

    /// Detect content type from file path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(ContentType::PlainText)
    }

    /// Canonical identifier used to group files and select the outline strategy
    pub fn canonical_mime_type(&self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::JavaScript => "text/javascript",
            ContentType::Css => "text/css",
            ContentType::Html => "text/html",
            ContentType::Json => "application/json",
            ContentType::TypeScript => "text/typescript",
        }
    }

    /// Get display name for the content type
    pub fn display_name(&self) -> &'static str {
        match self {
            ContentType::PlainText => "Plain Text",
            ContentType::JavaScript => "JavaScript",
            ContentType::Css => "CSS",
            ContentType::Html => "HTML",
            ContentType::Json => "JSON",
            ContentType::TypeScript => "TypeScript",
        }
    }

    /// Whether the bundled outline worker can extract symbols for this type
    pub fn has_outline(&self) -> bool {
        matches!(self, ContentType::JavaScript | ContentType::Css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(ContentType::from_extension("js"), ContentType::JavaScript);
        assert_eq!(ContentType::from_extension("MJS"), ContentType::JavaScript);
        assert_eq!(ContentType::from_extension("css"), ContentType::Css);
        assert_eq!(ContentType::from_extension("htm"), ContentType::Html);
        assert_eq!(ContentType::from_extension("txt"), ContentType::PlainText);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            ContentType::from_path(Path::new("/static/app.css")),
            ContentType::Css
        );
        assert_eq!(
            ContentType::from_path(Path::new("no_extension")),
            ContentType::PlainText
        );
    }

    #[test]
    fn test_outline_support() {
        assert!(ContentType::JavaScript.has_outline());
        assert!(ContentType::Css.has_outline());
        assert!(!ContentType::Html.has_outline());
    }
}
