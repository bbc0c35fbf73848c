//! Quick open session runtime
//!
//! Owns the provider, the filtered list host and the outline service, runs
//! the commands the provider returns and feeds their results back as
//! messages. All provider state is touched from the session's thread only.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::commands::Cmd;
use crate::filtered_list::{FilteredList, RenderedRow};
use crate::messages::Msg;
use crate::outline::OutlineService;
use crate::provider::{OutlineQuickOpen, QuickOpenProvider};
use crate::workspace::FileId;

/// How often stalled files are checked while waiting
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

pub struct QuickOpenSession<S: OutlineService> {
    provider: OutlineQuickOpen,
    list: FilteredList,
    service: S,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    tick_interval: Duration,
}

impl<S: OutlineService> QuickOpenSession<S> {
    pub fn new(provider: OutlineQuickOpen, service: S) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            provider,
            list: FilteredList::new(),
            service,
            msg_tx,
            msg_rx,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn provider(&self) -> &OutlineQuickOpen {
        &self.provider
    }

    pub fn list(&self) -> &FilteredList {
        &self.list
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Sender for messages produced outside the session
    pub fn sender(&self) -> Sender<Msg> {
        self.msg_tx.clone()
    }

    /// Open the quick open list: start a new activation
    pub fn activate(&mut self) {
        if let Some(cmd) = self.provider.attach() {
            self.process_cmd(cmd);
        }
        // Show whatever is already known (cache hits, or the empty state)
        self.list.refresh(&self.provider);
    }

    pub fn deactivate(&mut self) {
        self.provider.detach();
    }

    /// Tell the provider a file was closed
    pub fn file_closed(&mut self, file: FileId) {
        self.dispatch(Msg::file_closed(file));
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if let Some(cmd) = self.provider.update(msg) {
            self.process_cmd(cmd);
        }
    }

    fn process_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::RequestContent { generation, file } => {
                let tx = self.msg_tx.clone();
                std::thread::spawn(move || {
                    let result = file.request_content();
                    let _ = tx.send(Msg::content_loaded(generation, file.id(), result));
                });
            }
            cmd @ Cmd::ComputeOutline { .. } => {
                if let Some(request) = cmd.into_outline_request() {
                    self.service.compute_outline(request, self.msg_tx.clone());
                }
            }
            Cmd::Refresh => {
                self.list.refresh(&self.provider);
            }
        }
    }

    /// Apply every message that is already waiting
    ///
    /// Returns true if any message was processed.
    pub fn process_async_messages(&mut self) -> bool {
        let mut processed = false;
        while let Ok(msg) = self.msg_rx.try_recv() {
            processed = true;
            self.dispatch(msg);
        }
        processed
    }

    /// Check the in-flight file for a stall
    ///
    /// Hosts polling with [`Self::process_async_messages`] call this
    /// periodically so stalled files still time out.
    pub fn tick(&mut self) {
        self.dispatch(Msg::tick(Instant::now()));
    }

    /// Block until the current activation finished or `timeout` elapsed
    ///
    /// Returns true if the activation finished.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.provider.is_loading() {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!("Quick open did not finish within {:?}", timeout);
                return false;
            }
            let wait = self.tick_interval.min(deadline - now);
            match self.msg_rx.recv_timeout(wait) {
                Ok(msg) => self.dispatch(msg),
                Err(RecvTimeoutError::Timeout) => self.tick(),
                // The session holds a sender, so this cannot happen
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
        self.process_async_messages();
        true
    }

    pub fn set_query(&mut self, query: &str) {
        self.list.set_query(query, &self.provider);
    }

    pub fn rows(&self, limit: usize) -> Vec<RenderedRow> {
        self.list.render(&self.provider, limit)
    }

    /// Text shown when the list is empty
    pub fn empty_text(&self) -> Option<&'static str> {
        self.list.empty_text(&self.provider)
    }

    /// Select the `row`th visible row
    pub fn select(&self, row: Option<usize>) {
        self.list.select(&self.provider, row);
    }
}
