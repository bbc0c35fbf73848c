//! Cross-file outline search provider
//!
//! [`OutlineQuickOpen`] aggregates the outlines of every open file sharing
//! the focused file's content type and serves them to a filtered-list host
//! through the [`QuickOpenProvider`] contract.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::OutlineCache;
use crate::commands::Cmd;
use crate::filtered_list::{highlight_ranges, TextRegion};
use crate::messages::{Msg, QuickOpenMsg, WorkspaceMsg};
use crate::navigation::{IdentityNormalizer, LocationNormalizer, Revealer};
use crate::outline::OutlineItem;
use crate::pipeline::OutlinePipeline;
use crate::workspace::{
    eligible_files, EditorFocus, FileId, GeneratedNameFilter, OpenFiles, Workspace,
};

pub const NO_FILE_SELECTED: &str = "No file selected.";
pub const NO_OUTLINE_FOR_FILE: &str = "Open a JavaScript or CSS file to see symbols";
pub const NO_RESULTS: &str = "No results found";

/// What a filtered-list host needs from a data provider
pub trait QuickOpenProvider {
    /// Called when the host opens; starts collecting items
    fn attach(&mut self) -> Option<Cmd>;

    /// Called when the host closes
    fn detach(&mut self) {}

    fn item_count(&self) -> usize;

    /// Text the host fuzzy-matches against
    fn item_key_at(&self, index: usize) -> String;

    /// Higher is better
    fn item_score_at(&self, index: usize, query: &str) -> f64;

    fn render_item(
        &self,
        index: usize,
        query: &str,
        title: &mut TextRegion,
        subtitle: &mut TextRegion,
    );

    /// `None` when the host had nothing selected
    fn select_item(&self, index: Option<usize>, prompt: &str);

    fn not_found_text(&self) -> &'static str;
}

/// Collaborators of the provider
#[derive(Clone)]
pub struct QuickOpenContext {
    pub workspace: Arc<dyn Workspace>,
    pub focus: Arc<dyn EditorFocus>,
    pub normalizer: Arc<dyn LocationNormalizer>,
    pub revealer: Arc<dyn Revealer>,
}

impl QuickOpenContext {
    pub fn new(
        workspace: Arc<dyn Workspace>,
        focus: Arc<dyn EditorFocus>,
        revealer: Arc<dyn Revealer>,
    ) -> Self {
        Self {
            workspace,
            focus,
            normalizer: Arc::new(IdentityNormalizer),
            revealer,
        }
    }

    /// Context over an [`OpenFiles`] set, which is both workspace and focus
    pub fn for_open_files(files: Arc<OpenFiles>, revealer: Arc<dyn Revealer>) -> Self {
        Self::new(files.clone(), files, revealer)
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn LocationNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// Rank an item against a query
///
/// Only the part of the query before the first `(` is compared. An exact,
/// case-insensitive title match scores in `(0, 1]`, earlier lines ranking
/// higher; anything else scores `-(line + 1)`.
pub fn score_item(item: &OutlineItem, query: &str) -> f64 {
    let method_name = query.split('(').next().unwrap_or(query);
    let line = item.line as f64;
    if method_name.to_lowercase() == item.title.to_lowercase() {
        1.0 / (1.0 + line)
    } else {
        -(line + 1.0)
    }
}

pub struct OutlineQuickOpen {
    context: QuickOpenContext,
    exclude: GeneratedNameFilter,
    cache: OutlineCache,
    pipeline: OutlinePipeline,
}

impl OutlineQuickOpen {
    pub fn new(context: QuickOpenContext) -> Self {
        Self {
            context,
            exclude: GeneratedNameFilter::default(),
            cache: OutlineCache::new(),
            pipeline: OutlinePipeline::new(None),
        }
    }

    pub fn with_exclude_filter(mut self, exclude: GeneratedNameFilter) -> Self {
        self.exclude = exclude;
        self
    }

    /// Mark an in-flight file failed once it stalls for `timeout`
    pub fn with_file_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pipeline = OutlinePipeline::new(timeout);
        self
    }

    pub fn items(&self) -> &[OutlineItem] {
        self.pipeline.items()
    }

    pub fn item(&self, index: usize) -> Option<&OutlineItem> {
        self.pipeline.items().get(index)
    }

    /// True while the current activation still has files to process
    pub fn is_loading(&self) -> bool {
        self.pipeline.is_running()
    }

    pub fn failed_files(&self) -> &[FileId] {
        self.pipeline.failed_files()
    }

    pub fn cache(&self) -> &OutlineCache {
        &self.cache
    }

    pub fn pipeline(&self) -> &OutlinePipeline {
        &self.pipeline
    }

    /// Apply a message, returning the next side effect to run
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let now = Instant::now();
        match msg {
            Msg::QuickOpen(msg) => self.update_quick_open(msg, now),
            Msg::Workspace(WorkspaceMsg::FileClosed(file)) => {
                if self.cache.evict(file) {
                    tracing::debug!("Evicted cached outline of closed file {}", file);
                }
                self.pipeline.on_file_closed(file, &mut self.cache, now)
            }
        }
    }

    fn update_quick_open(&mut self, msg: QuickOpenMsg, now: Instant) -> Option<Cmd> {
        match msg {
            QuickOpenMsg::ContentLoaded {
                generation,
                file,
                result,
            } => self
                .pipeline
                .on_content_loaded(generation, file, result, &mut self.cache, now),
            QuickOpenMsg::OutlineChunk {
                generation,
                file,
                is_final,
                items,
            } => self
                .pipeline
                .on_outline_chunk(generation, file, is_final, items, &mut self.cache, now),
            QuickOpenMsg::OutlineFailed {
                generation,
                file,
                error,
            } => self
                .pipeline
                .on_outline_failed(generation, file, &error, &mut self.cache, now),
            QuickOpenMsg::Tick { now } => self.pipeline.on_tick(now, &mut self.cache),
        }
    }
}

impl QuickOpenProvider for OutlineQuickOpen {
    #[cfg_attr(feature = "profile-tracing", tracing::instrument(skip_all))]
    fn attach(&mut self) -> Option<Cmd> {
        let generation = self.pipeline.reset();
        let Some(focused) = self.context.focus.focused_file() else {
            tracing::debug!("Quick open activation {} without a focused file", generation);
            return None;
        };

        let files = eligible_files(
            self.context.workspace.as_ref(),
            focused.as_ref(),
            &self.exclude,
        );
        tracing::debug!(
            "Quick open activation {} for {} ({})",
            generation,
            focused.url(),
            focused.content_type().display_name()
        );
        self.pipeline.start(files, &mut self.cache, Instant::now())
    }

    fn detach(&mut self) {
        self.pipeline.cancel(&mut self.cache);
    }

    fn item_count(&self) -> usize {
        self.pipeline.items().len()
    }

    fn item_key_at(&self, index: usize) -> String {
        self.item(index).map(OutlineItem::key).unwrap_or_default()
    }

    fn item_score_at(&self, index: usize, query: &str) -> f64 {
        self.item(index)
            .map_or(f64::NEG_INFINITY, |item| score_item(item, query))
    }

    fn render_item(
        &self,
        index: usize,
        query: &str,
        title: &mut TextRegion,
        subtitle: &mut TextRegion,
    ) {
        let Some(item) = self.item(index) else {
            title.clear();
            subtitle.clear();
            return;
        };

        let key = item.key();
        title.highlights = highlight_ranges(&key, query);
        title.text = key;

        subtitle.text = format!(":{}:{}", item.file, item.line + 1);
        subtitle.highlights.clear();
    }

    fn select_item(&self, index: Option<usize>, _prompt: &str) {
        let Some(item) = index.and_then(|index| self.item(index)) else {
            return;
        };
        let Some(file) = self.context.workspace.file(item.owner) else {
            tracing::debug!("Owner {} of {:?} is gone, nothing to reveal", item.owner, item.title);
            return;
        };

        let location = file.location_at(item.line, 0);
        let normalized = self.context.normalizer.normalize(&location);
        if normalized.id() != location.id() {
            self.context.revealer.reveal(normalized);
        } else {
            self.context
                .revealer
                .reveal(file.location_at(item.line, item.column));
        }
    }

    fn not_found_text(&self) -> &'static str {
        if self.context.focus.focused_file().is_none() {
            NO_FILE_SELECTED
        } else if !self.pipeline.is_active() {
            NO_OUTLINE_FOR_FILE
        } else {
            NO_RESULTS
        }
    }
}
