use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::backend::ClipboardBackend;
use super::content::{classify, joined_paths, Content};
use super::history::{AddResult, HistoryStore};
use super::suppressor::WriteSuppressor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Stopped,
    Running,
}

/// Last values seen on (or written to) the clipboard, one slot per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprints {
    pub text: Option<String>,
    pub image_hash: Option<String>,
    /// Single path, or the sorted newline-joined set for several files
    pub files: Option<String>,
    pub change_token: Option<u64>,
}

impl Fingerprints {
    fn file_key(content: &Content) -> Option<String> {
        match content {
            Content::File(path) => Some(path.to_string_lossy().into_owned()),
            Content::MultiFile(paths) => Some(joined_paths(paths)),
            Content::Text(_) | Content::Image(_) => None,
        }
    }

    pub fn matches(&self, content: &Content) -> bool {
        match content {
            Content::Text(text) => self.text.as_deref() == Some(text.as_str()),
            Content::Image(image) => self.image_hash.as_deref() == Some(image.hash.as_str()),
            Content::File(_) | Content::MultiFile(_) => {
                self.files.is_some() && self.files == Self::file_key(content)
            }
        }
    }

    /// Remember `content` in its slot; the other slots are left alone
    pub fn record(&mut self, content: &Content) {
        match content {
            Content::Text(text) => self.text = Some(text.clone()),
            Content::Image(image) => self.image_hash = Some(image.hash.clone()),
            Content::File(_) | Content::MultiFile(_) => self.files = Self::file_key(content),
        }
    }
}

/// Suppression windows after the engine writes to the clipboard
#[derive(Debug, Clone, Copy)]
pub struct SuppressionWindows {
    pub text: Duration,
    pub file: Duration,
}

impl SuppressionWindows {
    pub fn for_content(&self, content: &Content) -> Duration {
        if content.is_file_backed() {
            self.file
        } else {
            self.text
        }
    }
}

impl Default for SuppressionWindows {
    fn default() -> Self {
        Self {
            text: Duration::from_millis(1_000),
            file: Duration::from_millis(1_500),
        }
    }
}

/// Result of a single poll
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// The watcher is not running
    Stopped,
    /// Inside a self-write window, or the one-shot flag was set
    Suppressed,
    /// The clipboard could not be read this time
    Unreadable,
    /// Nothing classifiable on the clipboard
    Empty,
    /// Same value as last time
    Unchanged,
    /// New text that is already somewhere in the history
    AlreadyInHistory,
    Recorded(AddResult),
}

/// Saved watcher state, restored when a clipboard write fails
#[derive(Debug, Clone)]
pub struct Checkpoint {
    fingerprints: Fingerprints,
    suppressor: WriteSuppressor,
}

/// Polling state machine deciding which clipboard values are new copies
#[derive(Debug, Clone)]
pub struct ClipboardWatcher {
    state: WatcherState,
    fingerprints: Fingerprints,
    suppressor: WriteSuppressor,
    windows: SuppressionWindows,
}

impl ClipboardWatcher {
    pub fn new(windows: SuppressionWindows) -> Self {
        Self {
            state: WatcherState::Stopped,
            fingerprints: Fingerprints::default(),
            suppressor: WriteSuppressor::new(),
            windows,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WatcherState::Running
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        &self.fingerprints
    }

    /// Enter `Running`, taking whatever is on the clipboard now as the baseline.
    /// The baseline itself is never recorded.
    pub fn start(&mut self, backend: &mut dyn ClipboardBackend) {
        self.state = WatcherState::Running;
        self.suppressor.disarm();
        self.fingerprints = Fingerprints::default();

        match backend.read() {
            Ok(raw) => {
                self.fingerprints.change_token = raw.change_token;
                if let Some(content) = classify(&raw) {
                    self.fingerprints.record(&content);
                }
            }
            Err(e) => debug!("no clipboard baseline at start: {}", e),
        }
        info!("clipboard watcher running");
    }

    pub fn stop(&mut self) {
        if self.state == WatcherState::Running {
            info!("clipboard watcher stopped");
        }
        self.state = WatcherState::Stopped;
    }

    /// Poll once and record a genuinely new copy into `history`
    pub fn tick(
        &mut self,
        backend: &mut dyn ClipboardBackend,
        history: &mut HistoryStore,
        now: DateTime<Utc>,
        instant: Instant,
    ) -> TickOutcome {
        if self.state != WatcherState::Running {
            return TickOutcome::Stopped;
        }
        if self.suppressor.should_skip(instant) {
            return TickOutcome::Suppressed;
        }

        let raw = match backend.read() {
            Ok(raw) => raw,
            Err(e) => {
                debug!("skipping tick, clipboard unreadable: {}", e);
                return TickOutcome::Unreadable;
            }
        };
        let recopied = self.observe_token(raw.change_token);

        let Some(content) = classify(&raw) else {
            return TickOutcome::Empty;
        };

        if self.fingerprints.matches(&content) {
            if !recopied {
                return TickOutcome::Unchanged;
            }
        } else if let Content::Text(text) = &content {
            if history.contains_text(text) {
                return TickOutcome::AlreadyInHistory;
            }
        }

        self.fingerprints.record(&content);
        if content.is_file_backed() {
            // Guards against the echo of our own later writes
            self.suppressor.arm(self.windows.file, instant);
        }

        let result = history.add(content, now);
        if result.retained() {
            info!(id = %result.outcome.id(), outcome = ?result.outcome, "recorded clipboard copy");
        } else {
            info!(id = %result.outcome.id(), "clipboard copy evicted at once, every other entry is pinned");
        }
        TickOutcome::Recorded(result)
    }

    /// True when the OS reports a write since the last poll
    fn observe_token(&mut self, token: Option<u64>) -> bool {
        let previous = std::mem::replace(&mut self.fingerprints.change_token, token);
        matches!((previous, token), (Some(prev), Some(cur)) if prev != cur)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            fingerprints: self.fingerprints.clone(),
            suppressor: self.suppressor,
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.fingerprints = checkpoint.fingerprints;
        self.suppressor = checkpoint.suppressor;
    }

    /// Arm suppression and fingerprints for a write the engine is about to make.
    /// Must happen before the write is issued.
    pub fn prepare_self_write(&mut self, content: &Content, instant: Instant) {
        self.suppressor.arm(self.windows.for_content(content), instant);
        self.suppressor.mark_self_write();
        self.fingerprints.record(content);
        // Our own write bumps the OS counter; adopt the new value on the next read
        self.fingerprints.change_token = None;
    }

    /// Forget every fingerprint and pending suppression so the next copy of
    /// anything counts as new
    pub fn reset_tracking(&mut self) {
        self.fingerprints = Fingerprints::default();
        self.suppressor.disarm();
    }
}
