//! Background outline worker
//!
//! Owns the tree-sitter parsers on a dedicated thread (parsers are !Sync)
//! and answers outline requests in order, one at a time.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use tree_sitter::Parser;

use super::{extract_outline, OutlineRequest, OutlineService, RawOutlineItem};
use crate::content_type::ContentType;
use crate::messages::Msg;

struct OutlineJob {
    request: OutlineRequest,
    reply: Sender<Msg>,
}

/// Thread-local parser state for the worker
struct OutlineParsers {
    parsers: HashMap<ContentType, Parser>,
}

impl OutlineParsers {
    fn new() -> Self {
        let mut state = Self {
            parsers: HashMap::new(),
        };
        state.init_language(ContentType::JavaScript);
        state.init_language(ContentType::Css);
        state
    }

    fn init_language(&mut self, content_type: ContentType) {
        let ts_lang: tree_sitter::Language = match content_type {
            ContentType::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            ContentType::Css => tree_sitter_css::LANGUAGE.into(),
            _ => return,
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&ts_lang) {
            tracing::error!("Failed to set language for {:?}: {}", content_type, e);
            return;
        }
        self.parsers.insert(content_type, parser);
    }

    /// Parse and extract; `Ok(None)` means the content type has no outline
    fn outline(
        &mut self,
        text: &str,
        content_type: ContentType,
    ) -> Result<Option<Vec<RawOutlineItem>>, String> {
        let Some(parser) = self.parsers.get_mut(&content_type) else {
            return Ok(None);
        };
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| format!("{} parse did not complete", content_type.display_name()))?;
        Ok(Some(extract_outline(&tree, text, content_type)))
    }
}

/// Tree-sitter backed outline service running on its own thread
pub struct OutlineWorker {
    jobs: Option<Sender<OutlineJob>>,
    handle: Option<JoinHandle<()>>,
}

impl OutlineWorker {
    /// Spawn the worker; results are delivered in chunks of `chunk_size` items
    pub fn spawn(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let (tx, rx) = mpsc::channel::<OutlineJob>();

        let spawned = std::thread::Builder::new()
            .name("outline-worker".into())
            .spawn(move || {
                let mut parsers = OutlineParsers::new();
                while let Ok(job) = rx.recv() {
                    run_job(&mut parsers, job, chunk_size);
                }
                tracing::debug!("Outline worker shutting down");
            });

        match spawned {
            Ok(handle) => Self {
                jobs: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                tracing::error!("Failed to spawn outline worker: {}", e);
                Self {
                    jobs: None,
                    handle: None,
                }
            }
        }
    }
}

fn run_job(parsers: &mut OutlineParsers, job: OutlineJob, chunk_size: usize) {
    let OutlineJob { request, reply } = job;
    let OutlineRequest {
        generation,
        file,
        text,
        content_type,
    } = request;

    let items = match parsers.outline(&text, content_type) {
        Ok(Some(items)) => items,
        Ok(None) => {
            tracing::debug!(
                "No outline support for {}, sending empty result",
                content_type.canonical_mime_type()
            );
            Vec::new()
        }
        Err(error) => {
            let _ = reply.send(Msg::outline_failed(generation, file, error));
            return;
        }
    };

    tracing::trace!("Outline for {:?}: {} items", file, items.len());

    if items.is_empty() {
        let _ = reply.send(Msg::outline_chunk(generation, file, true, Vec::new()));
        return;
    }

    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        let chunk: Vec<RawOutlineItem> = items.by_ref().take(chunk_size).collect();
        let is_final = items.peek().is_none();
        if reply
            .send(Msg::outline_chunk(generation, file, is_final, chunk))
            .is_err()
        {
            // Receiver dropped: nobody is listening for this outline anymore
            return;
        }
    }
}

impl OutlineService for OutlineWorker {
    fn compute_outline(&self, request: OutlineRequest, reply: Sender<Msg>) {
        let (generation, file) = (request.generation, request.file);
        let sent = match &self.jobs {
            Some(jobs) => jobs
                .send(OutlineJob {
                    request,
                    reply: reply.clone(),
                })
                .is_ok(),
            None => false,
        };

        if !sent {
            let _ = reply.send(Msg::outline_failed(
                generation,
                file,
                "outline worker is not running".to_string(),
            ));
        }
    }
}

impl Drop for OutlineWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
