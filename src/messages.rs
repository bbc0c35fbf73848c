//! Message types for the Elm-style architecture
//!
//! All state changes of the quick open provider flow through these message
//! types. Every asynchronous result carries the activation generation it was
//! requested under so stale results can be recognised and dropped.

use std::time::Instant;

use crate::outline::RawOutlineItem;
use crate::workspace::FileId;

/// Results of the asynchronous work started by the outline pipeline
#[derive(Debug, Clone)]
pub enum QuickOpenMsg {
    /// A file's text has been fetched (async result)
    ContentLoaded {
        generation: u64,
        file: FileId,
        result: Result<String, String>,
    },
    /// One batch of outline items for a file
    OutlineChunk {
        generation: u64,
        file: FileId,
        /// Exactly one chunk per request is final
        is_final: bool,
        items: Vec<RawOutlineItem>,
    },
    /// The outline service could not produce an outline
    OutlineFailed {
        generation: u64,
        file: FileId,
        error: String,
    },
    /// Periodic clock tick, used to time out stalled files
    Tick { now: Instant },
}

/// Workspace changes the provider must react to
#[derive(Debug, Clone)]
pub enum WorkspaceMsg {
    /// A file was closed; its cached outline is evicted
    FileClosed(FileId),
}

/// Top-level message type
#[derive(Debug, Clone)]
pub enum Msg {
    /// Outline pipeline messages
    QuickOpen(QuickOpenMsg),
    /// Workspace messages
    Workspace(WorkspaceMsg),
}

// Convenience constructors for common messages
impl Msg {
    pub fn content_loaded(generation: u64, file: FileId, result: Result<String, String>) -> Self {
        Msg::QuickOpen(QuickOpenMsg::ContentLoaded {
            generation,
            file,
            result,
        })
    }

    pub fn outline_chunk(
        generation: u64,
        file: FileId,
        is_final: bool,
        items: Vec<RawOutlineItem>,
    ) -> Self {
        Msg::QuickOpen(QuickOpenMsg::OutlineChunk {
            generation,
            file,
            is_final,
            items,
        })
    }

    pub fn outline_failed(generation: u64, file: FileId, error: String) -> Self {
        Msg::QuickOpen(QuickOpenMsg::OutlineFailed {
            generation,
            file,
            error,
        })
    }

    pub fn tick(now: Instant) -> Self {
        Msg::QuickOpen(QuickOpenMsg::Tick { now })
    }

    pub fn file_closed(file: FileId) -> Self {
        Msg::Workspace(WorkspaceMsg::FileClosed(file))
    }
}
