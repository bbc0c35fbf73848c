//! Outline items and the background outline service
//!
//! The outline service turns the text of one file into a flat list of
//! symbols, delivered to the caller in one or more chunks. The quick open
//! provider stamps every raw item with its owning file before indexing it.

mod extract;
mod worker;

use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::Serialize;

pub use extract::extract_outline;
pub use worker::OutlineWorker;

use crate::content_type::ContentType;
use crate::messages::Msg;
use crate::workspace::FileId;

/// Symbol kind for display and categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlineKind {
    Class,
    Function,
    Method,
    Getter,
    Setter,
    Rule,
    AtRule,
}

impl OutlineKind {
    /// Short label for rendering next to a symbol
    pub fn label(&self) -> &'static str {
        match self {
            OutlineKind::Class => "class",
            OutlineKind::Function => "fn",
            OutlineKind::Method => "method",
            OutlineKind::Getter => "get",
            OutlineKind::Setter => "set",
            OutlineKind::Rule => "rule",
            OutlineKind::AtRule => "@rule",
        }
    }
}

/// A symbol as produced by the outline service, before it is tied to a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutlineItem {
    pub kind: OutlineKind,
    pub title: String,
    /// Signature suffix, e.g. `(a, b)` for functions
    pub subtitle: Option<String>,
    /// 0-based
    pub line: usize,
    /// 0-based
    pub column: usize,
}

impl RawOutlineItem {
    pub fn new(kind: OutlineKind, title: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            title: title.into(),
            subtitle: None,
            line,
            column,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// One symbol occurrence in the aggregated result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineItem {
    pub kind: OutlineKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub line: usize,
    pub column: usize,
    /// Display path of the owning file, shared by all of its items
    pub file: Arc<str>,
    /// Owning file; resolved through the workspace, never kept alive by the item
    #[serde(skip)]
    pub owner: FileId,
}

impl OutlineItem {
    /// Tie a raw item to its owning file
    pub fn from_raw(raw: RawOutlineItem, file: &Arc<str>, owner: FileId) -> Self {
        Self {
            kind: raw.kind,
            title: raw.title,
            subtitle: raw.subtitle,
            line: raw.line,
            column: raw.column,
            file: Arc::clone(file),
            owner,
        }
    }

    /// Text the host fuzzy-matches the query against: title plus subtitle
    pub fn key(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{}{}", self.title, subtitle),
            None => self.title.clone(),
        }
    }
}

/// Derive the display path for a file URL
///
/// Absolute URLs display their path component; anything that does not parse
/// as an absolute URL is shown unchanged.
pub fn display_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(e) => {
            tracing::trace!("Using raw url {:?} as display path: {}", url, e);
            url.to_string()
        }
    }
}

/// A request to compute the outline of one file's text
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    /// Activation generation the request belongs to
    pub generation: u64,
    pub file: FileId,
    pub text: String,
    pub content_type: ContentType,
}

/// Background outline computation
///
/// Implementations answer a request by sending zero or more
/// `Msg::OutlineChunk` messages followed by exactly one chunk with
/// `is_final = true`, in order, or a single `Msg::OutlineFailed`.
pub trait OutlineService {
    fn compute_outline(&self, request: OutlineRequest, reply: Sender<Msg>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_uses_url_path() {
        assert_eq!(
            display_path("http://localhost:8080/static/app.css"),
            "/static/app.css"
        );
        assert_eq!(display_path("file:///home/me/src/main.js"), "/home/me/src/main.js");
    }

    #[test]
    fn test_display_path_keeps_unparseable_url() {
        assert_eq!(display_path("VM42 inline.js"), "VM42 inline.js");
        assert_eq!(display_path("relative/path.js"), "relative/path.js");
        assert_eq!(display_path(""), "");
    }

    #[test]
    fn test_key_concatenates_subtitle() {
        let file: Arc<str> = Arc::from("/a.js");
        let item = OutlineItem::from_raw(
            RawOutlineItem::new(OutlineKind::Function, "foo", 3, 0).with_subtitle("(a, b)"),
            &file,
            FileId(1),
        );
        assert_eq!(item.key(), "foo(a, b)");

        let rule = OutlineItem::from_raw(
            RawOutlineItem::new(OutlineKind::Rule, ".btn", 0, 0),
            &file,
            FileId(1),
        );
        assert_eq!(rule.key(), ".btn");
    }
}
