//! Outline aggregation pipeline
//!
//! Builds the flat result list of one activation by walking the eligible
//! files one at a time:
//!
//! ```text
//! queue ──pop──► cached? ──yes──► append cached items, next file
//!                  │ no
//!                  ▼
//!        AwaitingContent ──Cmd::RequestContent──► Msg::ContentLoaded
//!                  ▼
//!        AwaitingOutline ──Cmd::ComputeOutline──► Msg::OutlineChunk × n
//!                  ▼ (final chunk)
//!        commit cache entry, next file
//!
//! queue empty ──► Cmd::Refresh
//! ```
//!
//! Every command carries the activation generation; messages from an older
//! generation, or for a file that is not the one in flight, are dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::OutlineCache;
use crate::commands::Cmd;
use crate::outline::{display_path, OutlineItem, RawOutlineItem};
use crate::workspace::{FileId, SourceFile};

/// Where the in-flight file is in its outline computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    AwaitingContent,
    AwaitingOutline,
}

#[derive(Debug)]
struct InFlight {
    file: Arc<dyn SourceFile>,
    /// Display path shared by every item of this file
    display_path: Arc<str>,
    stage: FileStage,
    last_progress: Instant,
}

#[derive(Debug)]
pub struct OutlinePipeline {
    generation: u64,
    queue: VecDeque<Arc<dyn SourceFile>>,
    in_flight: Option<InFlight>,
    items: Vec<OutlineItem>,
    /// Set once the outline service has been asked for any file this activation
    active: bool,
    running: bool,
    failed: Vec<FileId>,
    /// A file making no progress for this long is marked failed
    file_timeout: Option<Duration>,
}

impl OutlinePipeline {
    pub fn new(file_timeout: Option<Duration>) -> Self {
        Self {
            generation: 0,
            queue: VecDeque::new(),
            in_flight: None,
            items: Vec::new(),
            active: false,
            running: false,
            failed: Vec::new(),
            file_timeout,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Items accumulated so far in this activation
    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while files remain to be processed
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Files whose outline failed or timed out in this activation
    pub fn failed_files(&self) -> &[FileId] {
        &self.failed
    }

    pub fn in_flight(&self) -> Option<(FileId, FileStage)> {
        self.in_flight
            .as_ref()
            .map(|in_flight| (in_flight.file.id(), in_flight.stage))
    }

    /// Number of files still waiting behind the in-flight one
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Start a new activation, invalidating everything in flight
    pub fn reset(&mut self) -> u64 {
        self.generation += 1;
        self.queue.clear();
        self.in_flight = None;
        self.items.clear();
        self.active = false;
        self.running = false;
        self.failed.clear();
        self.generation
    }

    /// Stop the current pass; results that arrive later are dropped
    pub fn cancel(&mut self, cache: &mut OutlineCache) {
        self.generation += 1;
        self.queue.clear();
        if let Some(in_flight) = self.in_flight.take() {
            cache.discard_pending(in_flight.file.id());
        }
        self.running = false;
    }

    /// Process `files` in order, starting with the first one
    #[cfg_attr(feature = "profile-tracing", tracing::instrument(skip_all))]
    pub fn start(
        &mut self,
        files: Vec<Arc<dyn SourceFile>>,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        tracing::debug!(
            "Outline pass {} starting over {} files",
            self.generation,
            files.len()
        );
        self.queue = files.into();
        self.running = true;
        self.advance(cache, now)
    }

    /// Move to the next file that needs work, consuming cache hits on the way
    fn advance(&mut self, cache: &mut OutlineCache, now: Instant) -> Option<Cmd> {
        while let Some(file) = self.queue.pop_front() {
            if let Some(cached) = cache.get(file.id()) {
                tracing::trace!("Cache hit for {} ({} items)", file.url(), cached.len());
                self.items.extend_from_slice(cached);
                continue;
            }
            if !file.content_type().has_outline() {
                tracing::trace!("No outline support for {}, skipping", file.url());
                continue;
            }

            tracing::debug!("Requesting content of {}", file.url());
            self.in_flight = Some(InFlight {
                file: Arc::clone(&file),
                display_path: Arc::from(display_path(file.url())),
                stage: FileStage::AwaitingContent,
                last_progress: now,
            });
            return Some(Cmd::RequestContent {
                generation: self.generation,
                file,
            });
        }

        self.in_flight = None;
        self.running = false;
        tracing::debug!(
            "Outline pass {} finished with {} items ({} failed files)",
            self.generation,
            self.items.len(),
            self.failed.len()
        );
        Some(Cmd::Refresh)
    }

    /// Whether a message belongs to the in-flight file at the given stage
    fn accepts(&self, generation: u64, file: FileId, stage: FileStage) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale outline message for {}: generation {} != {}",
                file,
                generation,
                self.generation
            );
            return false;
        }
        match &self.in_flight {
            Some(in_flight) if in_flight.file.id() == file && in_flight.stage == stage => true,
            _ => {
                tracing::debug!("Discarding outline message for {} not in {:?}", file, stage);
                false
            }
        }
    }

    pub fn on_content_loaded(
        &mut self,
        generation: u64,
        file: FileId,
        result: Result<String, String>,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        if !self.accepts(generation, file, FileStage::AwaitingContent) {
            return None;
        }

        match result {
            Ok(text) => {
                let in_flight = self.in_flight.as_mut()?;
                in_flight.stage = FileStage::AwaitingOutline;
                in_flight.last_progress = now;
                self.active = true;
                Some(Cmd::ComputeOutline {
                    generation,
                    file,
                    text,
                    content_type: in_flight.file.content_type(),
                })
            }
            Err(error) => self.fail_in_flight(&error, cache, now),
        }
    }

    pub fn on_outline_chunk(
        &mut self,
        generation: u64,
        file: FileId,
        is_final: bool,
        raw_items: Vec<RawOutlineItem>,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        if !self.accepts(generation, file, FileStage::AwaitingOutline) {
            return None;
        }
        let in_flight = self.in_flight.as_mut()?;
        in_flight.last_progress = now;

        let items: Vec<OutlineItem> = raw_items
            .into_iter()
            .map(|raw| OutlineItem::from_raw(raw, &in_flight.display_path, file))
            .collect();
        cache.stage(file, &items);
        self.items.extend(items);

        if !is_final {
            return None;
        }

        let cached = cache.commit(file);
        tracing::debug!("Outline of {} complete: {} items", file, cached);
        self.in_flight = None;
        self.advance(cache, now)
    }

    pub fn on_outline_failed(
        &mut self,
        generation: u64,
        file: FileId,
        error: &str,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        if !self.accepts(generation, file, FileStage::AwaitingOutline) {
            return None;
        }
        self.fail_in_flight(error, cache, now)
    }

    /// Time out the in-flight file if it stopped making progress
    pub fn on_tick(&mut self, now: Instant, cache: &mut OutlineCache) -> Option<Cmd> {
        let timeout = self.file_timeout?;
        let in_flight = self.in_flight.as_ref()?;
        let idle = now.saturating_duration_since(in_flight.last_progress);
        if idle < timeout {
            return None;
        }
        let reason = format!("no progress for {} ms ({:?})", idle.as_millis(), in_flight.stage);
        self.fail_in_flight(&reason, cache, now)
    }

    /// Forget a closed file; if it was in flight, move on
    pub fn on_file_closed(
        &mut self,
        file: FileId,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        self.queue.retain(|queued| queued.id() != file);
        match &self.in_flight {
            Some(in_flight) if in_flight.file.id() == file => {
                tracing::debug!("In-flight file {} was closed, skipping it", file);
                cache.discard_pending(file);
                self.in_flight = None;
                self.advance(cache, now)
            }
            _ => None,
        }
    }

    fn fail_in_flight(
        &mut self,
        error: &str,
        cache: &mut OutlineCache,
        now: Instant,
    ) -> Option<Cmd> {
        let in_flight = self.in_flight.take()?;
        let file = in_flight.file.id();
        tracing::warn!(
            "Outline of {} ({}) failed: {}",
            in_flight.file.url(),
            file,
            error
        );
        cache.discard_pending(file);
        self.failed.push(file);
        self.advance(cache, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::ContentType;
    use crate::outline::OutlineKind;
    use crate::workspace::OpenFile;

    fn file(id: u64, url: &str) -> Arc<dyn SourceFile> {
        Arc::new(OpenFile::in_memory(
            FileId(id),
            url,
            ContentType::JavaScript,
            "",
        )) as Arc<dyn SourceFile>
    }

    fn raw(title: &str, line: usize) -> RawOutlineItem {
        RawOutlineItem::new(OutlineKind::Function, title, line, 0)
    }

    fn expect_request_content(cmd: Option<Cmd>) -> FileId {
        match cmd {
            Some(Cmd::RequestContent { file, .. }) => file.id(),
            other => panic!("expected RequestContent, got {:?}", other),
        }
    }

    #[test]
    fn test_full_pass_walks_files_in_order() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        let generation = pipeline.reset();
        let now = Instant::now();

        let cmd = pipeline.start(vec![file(1, "http://h/a.js"), file(2, "b.js")], &mut cache, now);
        assert_eq!(expect_request_content(cmd), FileId(1));
        assert!(!pipeline.is_active());

        let cmd = pipeline.on_content_loaded(
            generation,
            FileId(1),
            Ok("src".into()),
            &mut cache,
            now,
        );
        assert!(matches!(cmd, Some(Cmd::ComputeOutline { file: FileId(1), .. })));
        assert!(pipeline.is_active());
        assert_eq!(pipeline.in_flight(), Some((FileId(1), FileStage::AwaitingOutline)));

        let cmd = pipeline.on_outline_chunk(
            generation,
            FileId(1),
            false,
            vec![raw("a", 0)],
            &mut cache,
            now,
        );
        assert!(cmd.is_none());
        assert_eq!(pipeline.items().len(), 1);
        assert!(!cache.contains(FileId(1)));

        let cmd = pipeline.on_outline_chunk(
            generation,
            FileId(1),
            true,
            vec![raw("b", 4)],
            &mut cache,
            now,
        );
        assert_eq!(expect_request_content(cmd), FileId(2));
        assert_eq!(cache.get(FileId(1)).map(<[OutlineItem]>::len), Some(2));
        assert_eq!(&*pipeline.items()[0].file, "/a.js");

        pipeline.on_content_loaded(generation, FileId(2), Ok(String::new()), &mut cache, now);
        let cmd = pipeline.on_outline_chunk(
            generation,
            FileId(2),
            true,
            vec![raw("c", 1)],
            &mut cache,
            now,
        );
        assert!(matches!(cmd, Some(Cmd::Refresh)));
        assert!(!pipeline.is_running());
        assert_eq!(&*pipeline.items()[2].file, "b.js");
    }

    #[test]
    fn test_cache_hits_need_no_async_work() {
        let mut cache = OutlineCache::new();
        let path: Arc<str> = Arc::from("/a.js");
        cache.stage(FileId(1), &[OutlineItem::from_raw(raw("a", 0), &path, FileId(1))]);
        cache.commit(FileId(1));

        let mut pipeline = OutlinePipeline::new(None);
        pipeline.reset();
        let cmd = pipeline.start(vec![file(1, "http://h/a.js")], &mut cache, Instant::now());
        assert!(matches!(cmd, Some(Cmd::Refresh)));
        assert_eq!(pipeline.items().len(), 1);
        assert!(!pipeline.is_active());
    }

    #[test]
    fn test_messages_from_old_generation_are_dropped() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        let old = pipeline.reset();
        let now = Instant::now();
        pipeline.start(vec![file(1, "a.js")], &mut cache, now);
        pipeline.on_content_loaded(old, FileId(1), Ok(String::new()), &mut cache, now);

        let current = pipeline.reset();
        pipeline.start(vec![file(1, "a.js")], &mut cache, now);

        let cmd = pipeline.on_outline_chunk(
            old,
            FileId(1),
            true,
            vec![raw("stale", 0)],
            &mut cache,
            now,
        );
        assert!(cmd.is_none());
        assert!(pipeline.items().is_empty());
        assert!(!cache.contains(FileId(1)));
        assert_eq!(pipeline.in_flight(), Some((FileId(1), FileStage::AwaitingContent)));
        assert_ne!(old, current);
    }

    #[test]
    fn test_chunk_before_content_is_ignored() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        let generation = pipeline.reset();
        let now = Instant::now();
        pipeline.start(vec![file(1, "a.js")], &mut cache, now);

        let cmd = pipeline.on_outline_chunk(
            generation,
            FileId(1),
            true,
            vec![raw("x", 0)],
            &mut cache,
            now,
        );
        assert!(cmd.is_none());
        assert!(pipeline.items().is_empty());
    }

    #[test]
    fn test_content_failure_marks_file_and_continues() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        let generation = pipeline.reset();
        let now = Instant::now();
        pipeline.start(vec![file(1, "a.js"), file(2, "b.js")], &mut cache, now);

        let cmd = pipeline.on_content_loaded(
            generation,
            FileId(1),
            Err("gone".into()),
            &mut cache,
            now,
        );
        assert_eq!(expect_request_content(cmd), FileId(2));
        assert_eq!(pipeline.failed_files(), &[FileId(1)]);
    }

    #[test]
    fn test_stalled_file_times_out_on_tick() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(Some(Duration::from_millis(100)));
        let generation = pipeline.reset();
        let start = Instant::now();
        pipeline.start(vec![file(1, "a.js")], &mut cache, start);
        pipeline.on_content_loaded(generation, FileId(1), Ok(String::new()), &mut cache, start);
        pipeline.on_outline_chunk(
            generation,
            FileId(1),
            false,
            vec![raw("partial", 0)],
            &mut cache,
            start,
        );

        assert!(pipeline
            .on_tick(start + Duration::from_millis(50), &mut cache)
            .is_none());
        let cmd = pipeline.on_tick(start + Duration::from_millis(150), &mut cache);
        assert!(matches!(cmd, Some(Cmd::Refresh)));
        assert_eq!(pipeline.failed_files(), &[FileId(1)]);
        // Partial items stay visible but are never cached
        assert_eq!(pipeline.items().len(), 1);
        assert!(!cache.contains(FileId(1)));

        // The late final chunk is no longer accepted
        let late = pipeline.on_outline_chunk(
            generation,
            FileId(1),
            true,
            vec![raw("late", 1)],
            &mut cache,
            start,
        );
        assert!(late.is_none());
        assert_eq!(pipeline.items().len(), 1);
    }

    #[test]
    fn test_closing_in_flight_file_moves_on() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        pipeline.reset();
        let now = Instant::now();
        pipeline.start(vec![file(1, "a.js"), file(2, "b.js"), file(3, "c.js")], &mut cache, now);

        assert!(pipeline.on_file_closed(FileId(3), &mut cache, now).is_none());
        assert_eq!(pipeline.queued(), 1);

        let cmd = pipeline.on_file_closed(FileId(1), &mut cache, now);
        assert_eq!(expect_request_content(cmd), FileId(2));
        assert!(pipeline.failed_files().is_empty());
    }

    #[test]
    fn test_cancel_invalidates_in_flight_work() {
        let mut cache = OutlineCache::new();
        let mut pipeline = OutlinePipeline::new(None);
        let generation = pipeline.reset();
        let now = Instant::now();
        pipeline.start(vec![file(1, "a.js")], &mut cache, now);
        pipeline.cancel(&mut cache);

        assert!(!pipeline.is_running());
        assert!(pipeline
            .on_content_loaded(generation, FileId(1), Ok(String::new()), &mut cache, now)
            .is_none());
    }
}
