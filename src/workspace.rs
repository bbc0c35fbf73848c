//! Workspace file model
//!
//! The quick open provider only sees files through the [`SourceFile`],
//! [`Workspace`] and [`EditorFocus`] traits. [`OpenFiles`] is the bundled
//! implementation backing the CLI and the tests: a set of open files with a
//! single focused file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;

use crate::content_type::ContentType;
use crate::navigation::Location;

/// Stable identifier of an open file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An open source file as seen by the quick open provider
pub trait SourceFile: Send + Sync + fmt::Debug {
    fn id(&self) -> FileId;

    fn content_type(&self) -> ContentType;

    /// Short name, e.g. `app.js` or `VM123`
    fn display_name(&self) -> &str;

    fn url(&self) -> &str;

    /// Current editable text. May block; callers run it off the main thread.
    fn request_content(&self) -> Result<String, String>;

    fn location_at(&self, line: usize, column: usize) -> Location {
        Location::new(self.id(), self.url(), line, column)
    }
}

/// Enumerates open files
pub trait Workspace {
    fn open_files(&self) -> Vec<Arc<dyn SourceFile>>;

    /// Resolve a file by id; `None` once the file has been closed
    fn file(&self, id: FileId) -> Option<Arc<dyn SourceFile>> {
        self.open_files().into_iter().find(|file| file.id() == id)
    }
}

/// Knows which file the editor currently shows
pub trait EditorFocus {
    fn focused_file(&self) -> Option<Arc<dyn SourceFile>>;
}

// ============================================================================
// Generated file exclusion
// ============================================================================

/// Default pattern for generated script names (`VM123`, `VM45 foo.js`)
pub const DEFAULT_EXCLUDE_PATTERN: &str = "^VM[0-9]+";

/// Excludes generated/virtual files from cross-file search by display name
#[derive(Debug, Clone)]
pub struct GeneratedNameFilter {
    patterns: Vec<Regex>,
}

impl Default for GeneratedNameFilter {
    fn default() -> Self {
        Self::from_patterns(&[DEFAULT_EXCLUDE_PATTERN.to_string()])
    }
}

impl GeneratedNameFilter {
    /// Compile patterns, skipping (and logging) invalid ones
    pub fn from_patterns(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}

/// Open files sharing the focused file's canonical content type, minus generated ones
pub fn eligible_files(
    workspace: &dyn Workspace,
    focused: &dyn SourceFile,
    filter: &GeneratedNameFilter,
) -> Vec<Arc<dyn SourceFile>> {
    let mime = focused.content_type().canonical_mime_type();
    workspace
        .open_files()
        .into_iter()
        .filter(|file| {
            file.content_type().canonical_mime_type() == mime
                && !filter.is_excluded(file.display_name())
        })
        .collect()
}

// ============================================================================
// OpenFiles
// ============================================================================

/// Where an open file's text comes from
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(String),
    Disk(PathBuf),
}

/// A concrete open file
#[derive(Debug, Clone)]
pub struct OpenFile {
    id: FileId,
    url: String,
    name: String,
    content_type: ContentType,
    source: FileSource,
}

/// Last URL segment, the way file names are displayed in tabs
fn name_from_url(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

impl OpenFile {
    pub fn in_memory(
        id: FileId,
        url: impl Into<String>,
        content_type: ContentType,
        text: impl Into<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id,
            name: name_from_url(&url).to_string(),
            url,
            content_type,
            source: FileSource::Memory(text.into()),
        }
    }

    /// A file read from disk on every content request
    pub fn from_path(id: FileId, path: &Path) -> Self {
        let url = url::Url::from_file_path(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.display().to_string());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name_from_url(&url).to_string());
        Self {
            id,
            url,
            name,
            content_type: ContentType::from_path(path),
            source: FileSource::Disk(path.to_path_buf()),
        }
    }
}

impl SourceFile for OpenFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn request_content(&self) -> Result<String, String> {
        match &self.source {
            FileSource::Memory(text) => Ok(text.clone()),
            FileSource::Disk(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        }
    }
}

#[derive(Debug, Default)]
struct OpenFilesState {
    files: Vec<Arc<OpenFile>>,
    focused: Option<FileId>,
    next_id: u64,
}

/// Open files in opening order, with at most one focused file
#[derive(Debug, Default)]
pub struct OpenFiles {
    state: RwLock<OpenFilesState>,
}

impl OpenFiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, OpenFilesState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, OpenFilesState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn allocate_id(state: &mut OpenFilesState) -> FileId {
        state.next_id += 1;
        FileId(state.next_id)
    }

    /// Open an in-memory file
    pub fn open_text(&self, url: &str, content_type: ContentType, text: &str) -> FileId {
        let mut state = self.write();
        let id = Self::allocate_id(&mut state);
        state
            .files
            .push(Arc::new(OpenFile::in_memory(id, url, content_type, text)));
        id
    }

    /// Open a file backed by a path on disk
    pub fn open_path(&self, path: &Path) -> FileId {
        let mut state = self.write();
        let id = Self::allocate_id(&mut state);
        state.files.push(Arc::new(OpenFile::from_path(id, path)));
        id
    }

    /// Close a file; returns false if it was not open
    pub fn close(&self, id: FileId) -> bool {
        let mut state = self.write();
        let before = state.files.len();
        state.files.retain(|file| file.id != id);
        if state.focused == Some(id) {
            state.focused = None;
        }
        state.files.len() != before
    }

    /// Focus an open file; returns false if it is not open
    pub fn focus(&self, id: FileId) -> bool {
        let mut state = self.write();
        if state.files.iter().any(|file| file.id == id) {
            state.focused = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_focus(&self) {
        self.write().focused = None;
    }

    pub fn len(&self) -> usize {
        self.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().files.is_empty()
    }
}

impl Workspace for OpenFiles {
    fn open_files(&self) -> Vec<Arc<dyn SourceFile>> {
        self.read()
            .files
            .iter()
            .map(|file| Arc::clone(file) as Arc<dyn SourceFile>)
            .collect()
    }

    fn file(&self, id: FileId) -> Option<Arc<dyn SourceFile>> {
        self.read()
            .files
            .iter()
            .find(|file| file.id == id)
            .map(|file| Arc::clone(file) as Arc<dyn SourceFile>)
    }
}

impl EditorFocus for OpenFiles {
    fn focused_file(&self) -> Option<Arc<dyn SourceFile>> {
        let focused = self.read().focused?;
        self.file(focused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names_are_excluded() {
        let filter = GeneratedNameFilter::default();
        assert!(filter.is_excluded("VM123"));
        assert!(filter.is_excluded("VM7 inline.js"));
        assert!(!filter.is_excluded("VM"));
        assert!(!filter.is_excluded("VMware.js"));
        assert!(!filter.is_excluded("app.VM123.js"));
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let filter =
            GeneratedNameFilter::from_patterns(&["(".to_string(), "\\.min\\.js$".to_string()]);
        assert!(filter.is_excluded("vendor.min.js"));
        assert!(!filter.is_excluded("("));
    }

    #[test]
    fn test_eligible_files_match_content_type() {
        let files = OpenFiles::new();
        let focused = files.open_text("http://host/a.css", ContentType::Css, "");
        files.open_text("http://host/b.css", ContentType::Css, ".b {}");
        files.open_text("http://host/index.html", ContentType::Html, "");
        files.open_text("VM123", ContentType::Css, ".vm {}");
        files.focus(focused);

        let focused_file = files.focused_file().unwrap();
        let eligible = eligible_files(
            &files,
            focused_file.as_ref(),
            &GeneratedNameFilter::default(),
        );
        let names: Vec<&str> = eligible.iter().map(|f| f.display_name()).collect();
        assert_eq!(names, vec!["a.css", "b.css"]);
    }

    #[test]
    fn test_close_clears_focus_and_resolution() {
        let files = OpenFiles::new();
        let id = files.open_text("http://host/a.js", ContentType::JavaScript, "");
        assert!(files.focus(id));
        files.clear_focus();
        assert!(files.focused_file().is_none());
        assert!(files.focus(id));
        assert!(files.close(id));
        assert!(files.focused_file().is_none());
        assert!(files.file(id).is_none());
        assert!(!files.close(id));
        assert!(!files.focus(id));
    }

    #[test]
    fn test_disk_file_reads_current_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.css");
        std::fs::write(&path, ".a {}").unwrap();

        let file = OpenFile::from_path(FileId(1), &path);
        assert_eq!(file.display_name(), "style.css");
        assert_eq!(file.content_type(), ContentType::Css);
        assert!(file.url().starts_with("file://"));
        assert_eq!(file.request_content().unwrap(), ".a {}");

        std::fs::write(&path, ".b {}").unwrap();
        assert_eq!(file.request_content().unwrap(), ".b {}");

        std::fs::remove_file(&path).unwrap();
        assert!(file.request_content().is_err());
    }
}
