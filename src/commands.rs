//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.
//! The session executes them and feeds the outcome back as messages.

use std::sync::Arc;

use crate::content_type::ContentType;
use crate::outline::OutlineRequest;
use crate::workspace::{FileId, SourceFile};

/// Side effects requested by the quick open provider
#[derive(Debug)]
pub enum Cmd {
    /// Fetch a file's current text asynchronously
    /// Sends Msg::QuickOpen(ContentLoaded) when done
    RequestContent {
        generation: u64,
        file: Arc<dyn SourceFile>,
    },
    /// Run the outline service over a file's text
    /// Sends Msg::QuickOpen(OutlineChunk) one or more times
    ComputeOutline {
        generation: u64,
        file: FileId,
        text: String,
        content_type: ContentType,
    },
    /// The aggregation pass finished; the host should re-filter its rows
    Refresh,
}

impl Cmd {
    /// Build the outline service request for a `ComputeOutline` command
    pub fn into_outline_request(self) -> Option<OutlineRequest> {
        match self {
            Cmd::ComputeOutline {
                generation,
                file,
                text,
                content_type,
            } => Some(OutlineRequest {
                generation,
                file,
                text,
                content_type,
            }),
            _ => None,
        }
    }
}
