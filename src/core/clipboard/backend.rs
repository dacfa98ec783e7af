//! Seams between the engine and the outside world
//!
//! The engine never touches the OS directly: clipboard access, time and copy
//! feedback all come in through these traits so tests can swap them out.

use chrono::{DateTime, Utc};
use std::time::Instant;

use super::content::{Content, RawClipboard};
use crate::shared::errors::ClipboardError;
use crate::shared::types::HistoryEntry;

/// The system clipboard.
///
/// The OS serializes access; callers must still expect other processes to
/// change the contents between any two calls.
pub trait ClipboardBackend: Send {
    /// Snapshot every representation currently on the clipboard
    fn read(&mut self) -> Result<RawClipboard, ClipboardError>;

    /// Replace the clipboard contents with `content` in its native representation
    fn write(&mut self, content: &Content) -> Result<(), ClipboardError>;

    fn clear(&mut self) -> Result<(), ClipboardError>;
}

/// Wall-clock time for timestamps, monotonic time for suppression deadlines
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
    fn instant(&self) -> Instant;
}

/// Notified after an entry has been written back to the clipboard
pub trait CopyFeedback: Send {
    fn copied(&self, entry: &HistoryEntry);
}
