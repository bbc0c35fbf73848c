//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use outline_quick_open::navigation::{Location, LocationNormalizer, RecordingRevealer};
use outline_quick_open::outline::{OutlineKind, OutlineRequest, OutlineService, RawOutlineItem};
use outline_quick_open::provider::{OutlineQuickOpen, QuickOpenContext};
use outline_quick_open::session::QuickOpenSession;
use outline_quick_open::workspace::{FileId, GeneratedNameFilter, OpenFiles};
use outline_quick_open::Msg;

/// Upper bound for waiting on a pass in tests
pub const WAIT: Duration = Duration::from_secs(5);

/// How the mock service answers requests for one file
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send these chunks, the last one final
    Chunks(Vec<Vec<RawOutlineItem>>),
    /// Report a failure
    Fail(String),
    /// Never answer
    Silent,
}

/// Outline service answering synchronously from a script, counting requests
#[derive(Debug, Default)]
pub struct MockOutlineService {
    replies: Mutex<HashMap<FileId, Reply>>,
    requests: Mutex<Vec<FileId>>,
}

impl MockOutlineService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, file: FileId, reply: Reply) -> Self {
        self.set_reply(file, reply);
        self
    }

    /// Single final chunk with `items`
    pub fn outline(self, file: FileId, items: Vec<RawOutlineItem>) -> Self {
        self.reply(file, Reply::Chunks(vec![items]))
    }

    pub fn set_reply(&self, file: FileId, reply: Reply) {
        self.replies.lock().unwrap().insert(file, reply);
    }

    /// Files the service was asked about, in order
    pub fn requests(&self) -> Vec<FileId> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, file: FileId) -> usize {
        self.requests().iter().filter(|id| **id == file).count()
    }
}

impl OutlineService for MockOutlineService {
    fn compute_outline(&self, request: OutlineRequest, reply: Sender<Msg>) {
        self.requests.lock().unwrap().push(request.file);
        let script = self
            .replies
            .lock()
            .unwrap()
            .get(&request.file)
            .cloned()
            .unwrap_or(Reply::Chunks(vec![]));

        match script {
            Reply::Chunks(chunks) if chunks.is_empty() => {
                let _ = reply.send(Msg::outline_chunk(
                    request.generation,
                    request.file,
                    true,
                    vec![],
                ));
            }
            Reply::Chunks(chunks) => {
                let last = chunks.len() - 1;
                for (i, items) in chunks.into_iter().enumerate() {
                    let _ = reply.send(Msg::outline_chunk(
                        request.generation,
                        request.file,
                        i == last,
                        items,
                    ));
                }
            }
            Reply::Fail(error) => {
                let _ = reply.send(Msg::outline_failed(request.generation, request.file, error));
            }
            Reply::Silent => {}
        }
    }
}

/// Redirects locations of some URLs to another URL, like a source map would
#[derive(Debug, Default)]
pub struct MappedNormalizer {
    pub mapping: HashMap<String, String>,
}

impl MappedNormalizer {
    pub fn new(from: &str, to: &str) -> Self {
        let mut mapping = HashMap::new();
        mapping.insert(from.to_string(), to.to_string());
        Self { mapping }
    }
}

impl LocationNormalizer for MappedNormalizer {
    fn normalize(&self, location: &Location) -> Location {
        match self.mapping.get(&location.url) {
            Some(url) => Location::new(location.file, url.clone(), location.line + 10, 0),
            None => location.clone(),
        }
    }
}

pub fn function(title: &str, line: usize) -> RawOutlineItem {
    RawOutlineItem::new(OutlineKind::Function, title, line, 9)
}

pub fn rule(selector: &str, line: usize) -> RawOutlineItem {
    RawOutlineItem::new(OutlineKind::Rule, selector, line, 0)
}

/// Open files, a recording revealer and a session over a mock service
pub struct Fixture {
    pub files: Arc<OpenFiles>,
    pub revealer: Arc<RecordingRevealer>,
    pub session: QuickOpenSession<MockOutlineService>,
}

impl Fixture {
    pub fn new(files: Arc<OpenFiles>, service: MockOutlineService) -> Self {
        Self::with_provider(files, service, |provider| provider)
    }

    /// Like [`Fixture::new`], letting the caller configure the provider
    pub fn with_provider(
        files: Arc<OpenFiles>,
        service: MockOutlineService,
        configure: impl FnOnce(OutlineQuickOpen) -> OutlineQuickOpen,
    ) -> Self {
        Self::build(files, service, None, configure)
    }

    pub fn with_normalizer(
        files: Arc<OpenFiles>,
        service: MockOutlineService,
        normalizer: Arc<dyn LocationNormalizer>,
    ) -> Self {
        Self::build(files, service, Some(normalizer), |provider| provider)
    }

    fn build(
        files: Arc<OpenFiles>,
        service: MockOutlineService,
        normalizer: Option<Arc<dyn LocationNormalizer>>,
        configure: impl FnOnce(OutlineQuickOpen) -> OutlineQuickOpen,
    ) -> Self {
        let revealer = Arc::new(RecordingRevealer::new());
        let mut context = QuickOpenContext::for_open_files(Arc::clone(&files), revealer.clone());
        if let Some(normalizer) = normalizer {
            context = context.with_normalizer(normalizer);
        }
        let provider = configure(
            OutlineQuickOpen::new(context).with_exclude_filter(GeneratedNameFilter::default()),
        );
        Self {
            files,
            revealer,
            session: QuickOpenSession::new(provider, service)
                .with_tick_interval(Duration::from_millis(5)),
        }
    }

    /// Activate and wait for the pass to finish
    pub fn activate(&mut self) {
        self.session.activate();
        assert!(self.session.run_until_idle(WAIT), "pass did not finish");
    }
}
