//! Navigation targets and the collaborators that act on them
//!
//! Selecting a quick open row builds a [`Location`], lets a
//! [`LocationNormalizer`] remap it (e.g. to an original source behind a
//! source map), and hands the result to a [`Revealer`].

use std::fmt;
use std::sync::Mutex;

use crate::workspace::FileId;

/// A position in an open file (line/column are 0-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: FileId,
    pub url: String,
    pub line: usize,
    pub column: usize,
}

/// Identity of a location, comparable across normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationId(String);

impl Location {
    pub fn new(file: FileId, url: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file,
            url: url.into(),
            line,
            column,
        }
    }

    pub fn id(&self) -> LocationId {
        LocationId(format!("{}:{}:{}", self.url, self.line, self.column))
    }
}

impl fmt::Display for Location {
    /// `url:line:column`, one-based for humans
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.url, self.line + 1, self.column + 1)
    }
}

/// Maps a location to the one the user should actually land on
pub trait LocationNormalizer {
    fn normalize(&self, location: &Location) -> Location;
}

/// Leaves every location untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityNormalizer;

impl LocationNormalizer for IdentityNormalizer {
    fn normalize(&self, location: &Location) -> Location {
        location.clone()
    }
}

/// Shows a location to the user
pub trait Revealer {
    fn reveal(&self, location: Location);
}

/// Remembers revealed locations in order
#[derive(Debug, Default)]
pub struct RecordingRevealer {
    revealed: Mutex<Vec<Location>>,
}

impl RecordingRevealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revealed(&self) -> Vec<Location> {
        self.revealed
            .lock()
            .map(|revealed| revealed.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn last(&self) -> Option<Location> {
        self.revealed().pop()
    }
}

impl Revealer for RecordingRevealer {
    fn reveal(&self, location: Location) {
        tracing::debug!("Revealing {}", location);
        match self.revealed.lock() {
            Ok(mut revealed) => revealed.push(location),
            Err(poisoned) => poisoned.into_inner().push(location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_id_distinguishes_positions() {
        let a = Location::new(FileId(1), "http://host/a.js", 3, 0);
        let b = Location::new(FileId(1), "http://host/a.js", 3, 4);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_display_is_one_based() {
        let loc = Location::new(FileId(1), "/src/a.js", 0, 9);
        assert_eq!(loc.to_string(), "/src/a.js:1:10");
    }

    #[test]
    fn test_recording_revealer_keeps_order() {
        let revealer = RecordingRevealer::new();
        revealer.reveal(Location::new(FileId(1), "a", 1, 0));
        revealer.reveal(Location::new(FileId(2), "b", 2, 0));
        assert_eq!(revealer.revealed().len(), 2);
        assert_eq!(revealer.last().unwrap().file, FileId(2));
    }
}
