//! Cross-file outline quick open
//!
//! Aggregates the symbol outlines of every open file sharing the focused
//! file's content type and serves them, fuzzy-filtered and ranked, to a
//! quick open list. Built on the Elm Architecture: the provider turns
//! [`Msg`]s into [`Cmd`]s and the [`session`] runtime executes them.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod content_type;
pub mod filtered_list;
pub mod messages;
pub mod navigation;
pub mod outline;
pub mod pipeline;
pub mod provider;
pub mod session;
pub mod tracing;
pub mod workspace;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::QuickOpenConfig;
pub use messages::Msg;
pub use provider::{OutlineQuickOpen, QuickOpenContext, QuickOpenProvider};
pub use session::QuickOpenSession;
