//! Shared test utilities for the moviliax-site test suite.
//!
//! Provides a throwaway site tree builder and test doubles for the
//! newsletter flow's seams (transport, view, clock, logger).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteTree::new()
//!     .page("index.html")
//!     .page_modified("blog.html", "2025-01-01T00:00:00Z");
//! let files = site.discover(&SiteConfig::default());
//! ```

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::logger::Logger;
use crate::newsletter::{
    Clock, FormView, MessageKind, SubmitControl, SubscribeRequest, Transport, TransportError,
};
use crate::sitemap;

// =========================================================================
// Site tree fixture
// =========================================================================

/// A site root in a temp directory, removed on drop.
pub struct SiteTree {
    tmp: TempDir,
}

impl SiteTree {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    /// Add a minimal HTML file, creating parent directories.
    pub fn page(self, rel: &str) -> Self {
        let path = self.tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("<!doctype html><title>{rel}</title>")).unwrap();
        self
    }

    /// Add a page and pin its modification time (RFC 3339).
    pub fn page_modified(self, rel: &str, rfc3339: &str) -> Self {
        let site = self.page(rel);
        set_mtime(&site.tmp.path().join(rel), rfc3339);
        site
    }

    /// Discovered files as sorted `/`-separated relative paths.
    pub fn discover(&self, config: &SiteConfig) -> Vec<String> {
        let files = sitemap::discover(
            self.path(),
            &config.exclude_dirs,
            &config.exclude_files,
            &config.document_extension,
        )
        .unwrap();
        let mut rel: Vec<String> = files
            .iter()
            .map(|f| sitemap::relative_path(f, self.path()))
            .collect();
        rel.sort();
        rel
    }
}

pub fn set_mtime(path: &Path, rfc3339: &str) {
    let when: SystemTime = chrono::DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&chrono::Utc)
        .into();
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

// =========================================================================
// Newsletter doubles
// =========================================================================

/// Transport double that records requests and replays a canned result.
pub struct FakeTransport {
    pub requests: Vec<SubscribeRequest>,
    pub fail_with_status: Option<u16>,
}

impl FakeTransport {
    pub fn ok() -> Self {
        Self {
            requests: Vec::new(),
            fail_with_status: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            requests: Vec::new(),
            fail_with_status: Some(status),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.len()
    }
}

impl Transport for FakeTransport {
    fn subscribe(
        &mut self,
        request: &SubscribeRequest,
    ) -> Result<serde_json::Value, TransportError> {
        self.requests.push(request.clone());
        match self.fail_with_status {
            Some(status) => Err(TransportError::Status(status)),
            None => Ok(serde_json::json!({ "ok": true })),
        }
    }
}

/// Everything the form asked the view to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Message(String, MessageKind, Duration),
    ClearInput,
    Control(SubmitControl),
}

#[derive(Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn messages(&self) -> Vec<(&str, MessageKind)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Message(text, kind, _) => Some((text.as_str(), *kind)),
                _ => None,
            })
            .collect()
    }

    pub fn last_message(&self) -> (&str, MessageKind) {
        *self.messages().last().expect("no message shown")
    }

    pub fn controls(&self) -> Vec<SubmitControl> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Control(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn input_cleared(&self) -> bool {
        self.events.contains(&ViewEvent::ClearInput)
    }
}

impl FormView for RecordingView {
    fn show_message(&mut self, text: &str, kind: MessageKind, dismiss_after: Duration) {
        self.events
            .push(ViewEvent::Message(text.to_string(), kind, dismiss_after));
    }

    fn clear_input(&mut self) {
        self.events.push(ViewEvent::ClearInput);
    }

    fn set_submit_control(&mut self, control: SubmitControl) {
        self.events.push(ViewEvent::Control(control));
    }
}

/// Manually advanced clock; clones share the same time.
#[derive(Clone)]
pub struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// Logger double keeping `(level, message)` pairs.
#[derive(Default)]
pub struct RecordingLogger {
    pub lines: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingLogger {
    pub fn has(&self, level: &str, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.lines.borrow_mut().push(("info", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.lines.borrow_mut().push(("warn", message.to_string()));
    }

    fn error(&self, message: &str, error: Option<&dyn std::error::Error>) {
        let line = match error {
            Some(e) => format!("{message}: {e}"),
            None => message.to_string(),
        };
        self.lines.borrow_mut().push(("error", line));
    }
}
