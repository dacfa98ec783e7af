//! Clipboard engine
//!
//! Owns the history, the watcher and the collaborators, and publishes a
//! `HistoryEvent` for every change. Everything here is synchronous and runs on
//! one owner; `monitor` wraps it in a task for async callers.

use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use super::backend::{ClipboardBackend, Clock, CopyFeedback};
use super::history::{AddOutcome, AddResult, HistoryStore};
use super::watcher::{ClipboardWatcher, Fingerprints, SuppressionWindows, TickOutcome};
use crate::shared::errors::{EngineError, EngineResult};
use crate::shared::events::HistoryEvent;
use crate::shared::settings::EngineSettings;
use crate::shared::types::HistoryEntry;
use crate::system::clock::SystemClock;
use crate::system::feedback::Silent;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct ClipboardEngine {
    history: HistoryStore,
    watcher: ClipboardWatcher,
    backend: Box<dyn ClipboardBackend>,
    clock: Box<dyn Clock>,
    feedback: Box<dyn CopyFeedback>,
    events: broadcast::Sender<HistoryEvent>,
}

impl ClipboardEngine {
    /// Create a stopped engine using the real clock and no copy feedback
    pub fn new(settings: &EngineSettings, backend: impl ClipboardBackend + 'static) -> Self {
        let history = HistoryStore::new(settings.capacity, settings.sort_order)
            .with_preview_chars(settings.preview_chars);
        let windows = SuppressionWindows {
            text: settings.text_suppression(),
            file: settings.file_suppression(),
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            history,
            watcher: ClipboardWatcher::new(windows),
            backend: Box::new(backend),
            clock: Box::new(SystemClock),
            feedback: Box::new(Silent),
            events,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_feedback(mut self, feedback: impl CopyFeedback + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<HistoryEvent> {
        self.events.clone()
    }

    fn emit(&self, event: HistoryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Start (or restart) watching from the current clipboard contents
    pub fn start(&mut self) {
        let was_running = self.watcher.is_running();
        self.watcher.start(self.backend.as_mut());
        if !was_running {
            self.emit(HistoryEvent::MonitorStateChanged(true));
        }
    }

    pub fn stop(&mut self) {
        if self.watcher.is_running() {
            self.watcher.stop();
            self.emit(HistoryEvent::MonitorStateChanged(false));
        }
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    /// Poll the clipboard once
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        let instant = self.clock.instant();
        let outcome = self
            .watcher
            .tick(self.backend.as_mut(), &mut self.history, now, instant);

        if let TickOutcome::Recorded(result) = &outcome {
            self.publish_add(result);
        }
        outcome
    }

    fn publish_add(&self, result: &AddResult) {
        let id = result.outcome.id();
        // The new entry may itself have been evicted when every other slot is pinned
        if let Some(entry) = self.history.get(id) {
            let event = match result.outcome {
                AddOutcome::Inserted(_) => HistoryEvent::Inserted(entry.clone()),
                AddOutcome::Merged(_) => HistoryEvent::Merged(entry.clone()),
            };
            self.emit(event);
        }
        if !result.evicted.is_empty() {
            let ids = result.evicted.iter().map(|e| e.id).collect();
            self.emit(HistoryEvent::Evicted(ids));
        }
    }

    /// Snapshot of the history in display order
    pub fn items(&self) -> Vec<HistoryEntry> {
        self.history.items().to_vec()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        self.watcher.fingerprints()
    }

    /// Put an entry back on the clipboard without it being seen as a new copy.
    ///
    /// The entry itself is not touched. If the write fails nothing is armed.
    pub fn copy_to_clipboard(&mut self, id: Uuid) -> EngineResult<()> {
        let entry = self
            .history
            .get(id)
            .cloned()
            .ok_or(EngineError::EntryNotFound(id))?;

        let checkpoint = self.watcher.checkpoint();
        self.watcher
            .prepare_self_write(&entry.content, self.clock.instant());

        if let Err(e) = self.backend.write(&entry.content) {
            warn!(%id, "failed to write entry to clipboard: {}", e);
            self.watcher.restore(checkpoint);
            return Err(e.into());
        }

        info!(%id, preview = %entry.preview, "copied entry back to clipboard");
        self.feedback.copied(&entry);
        self.emit(HistoryEvent::Copied(id));
        Ok(())
    }

    /// Flip the pin state of an entry, returning the new state
    pub fn toggle_pin(&mut self, id: Uuid) -> EngineResult<bool> {
        let pinned = self
            .history
            .toggle_pin(id)
            .ok_or(EngineError::EntryNotFound(id))?;
        if let Some(entry) = self.history.get(id) {
            self.emit(HistoryEvent::PinToggled(entry.clone()));
        }
        Ok(pinned)
    }

    /// Delete one entry. Emptying the history also forgets every fingerprint
    /// and clears the clipboard.
    pub fn remove(&mut self, id: Uuid) -> EngineResult<HistoryEntry> {
        let removed = self
            .history
            .remove(id)
            .ok_or(EngineError::EntryNotFound(id))?;
        self.emit(HistoryEvent::Removed(id));

        if self.history.is_empty() {
            self.reset_clipboard();
        }
        Ok(removed)
    }

    /// Drop the whole history, forget every fingerprint and clear the clipboard
    pub fn clear(&mut self) {
        let count = self.history.clear();
        self.reset_clipboard();
        info!(count, "cleared clipboard history");
        self.emit(HistoryEvent::Cleared);
    }

    fn reset_clipboard(&mut self) {
        self.watcher.reset_tracking();
        if let Err(e) = self.backend.clear() {
            warn!("failed to clear clipboard: {}", e);
        }
    }
}
