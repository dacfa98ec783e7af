//! In-memory stand-ins for the clipboard, the clock and copy feedback

use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::backend::{ClipboardBackend, Clock, CopyFeedback};
use super::content::{Content, RawClipboard, RawImage};
use crate::shared::errors::ClipboardError;
use crate::shared::types::HistoryEntry;

#[derive(Debug, Default)]
struct FakeState {
    raw: RawClipboard,
    token: u64,
    writes: Vec<Content>,
    clears: usize,
    reads: usize,
    hide_token: bool,
    fail_reads: bool,
    fail_writes: bool,
}

/// Shared fake clipboard; clones see the same contents.
///
/// Every mutation bumps the change token, like an OS sequence number.
#[derive(Debug, Clone, Default)]
pub struct FakeClipboard {
    state: Arc<Mutex<FakeState>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, raw: RawClipboard) {
        let mut state = self.state.lock().unwrap();
        state.token += 1;
        state.raw = raw;
    }

    /// Another application copies text
    pub fn set_text(&self, text: &str) {
        self.replace(RawClipboard {
            text: Some(text.to_string()),
            ..RawClipboard::default()
        });
    }

    pub fn set_files(&self, files: Vec<PathBuf>) {
        let text = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        self.replace(RawClipboard {
            files: Some(files),
            text: Some(text),
            ..RawClipboard::default()
        });
    }

    pub fn set_image(&self, width: usize, height: usize, bytes: Vec<u8>) {
        self.replace(RawClipboard {
            image: Some(RawImage { width, height, bytes }),
            ..RawClipboard::default()
        });
    }

    /// Behave like a backend with no OS change counter
    pub fn hide_change_token(&self, hide: bool) {
        self.state.lock().unwrap().hide_token = hide;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Contents the engine wrote, oldest first
    pub fn writes(&self) -> Vec<Content> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn clears(&self) -> usize {
        self.state.lock().unwrap().clears
    }

    /// Successful and failed reads alike
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn current_text(&self) -> Option<String> {
        self.state.lock().unwrap().raw.text.clone()
    }
}

impl ClipboardBackend for FakeClipboard {
    fn read(&mut self) -> Result<RawClipboard, ClipboardError> {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if state.fail_reads {
            return Err(ClipboardError::Read("fake read failure".into()));
        }
        let mut raw = state.raw.clone();
        raw.change_token = (!state.hide_token).then_some(state.token);
        Ok(raw)
    }

    fn write(&mut self, content: &Content) -> Result<(), ClipboardError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(ClipboardError::Write("fake write failure".into()));
        }
        state.raw = match content {
            Content::Text(text) => RawClipboard {
                text: Some(text.clone()),
                ..RawClipboard::default()
            },
            Content::Image(image) => RawClipboard {
                image: Some(RawImage {
                    width: image.width,
                    height: image.height,
                    bytes: image.bytes.to_vec(),
                }),
                ..RawClipboard::default()
            },
            Content::File(path) => RawClipboard {
                files: Some(vec![path.clone()]),
                ..RawClipboard::default()
            },
            Content::MultiFile(paths) => RawClipboard {
                files: Some(paths.clone()),
                ..RawClipboard::default()
            },
        };
        state.token += 1;
        state.writes.push(content.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClipboardError> {
        let mut state = self.state.lock().unwrap();
        state.raw = RawClipboard::default();
        state.token += 1;
        state.clears += 1;
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    wall: DateTime<Utc>,
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            wall: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.wall + chrono::Duration::from_std(self.elapsed()).unwrap()
    }

    fn instant(&self) -> Instant {
        self.base + self.elapsed()
    }
}

/// Remembers which entries were copied back
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    copied: Arc<Mutex<Vec<Uuid>>>,
}

impl RecordingFeedback {
    pub fn copied_ids(&self) -> Vec<Uuid> {
        self.copied.lock().unwrap().clone()
    }
}

impl CopyFeedback for RecordingFeedback {
    fn copied(&self, entry: &HistoryEntry) {
        self.copied.lock().unwrap().push(entry.id);
    }
}
