//! Copy feedback implementations

use std::io::Write;
use tracing::debug;

use crate::core::clipboard::backend::CopyFeedback;
use crate::shared::types::HistoryEntry;

/// No feedback at all
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl CopyFeedback for Silent {
    fn copied(&self, _entry: &HistoryEntry) {}
}

/// Rings the terminal bell when an entry is copied back
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl CopyFeedback for TerminalBell {
    fn copied(&self, entry: &HistoryEntry) {
        let mut stderr = std::io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            debug!(id = %entry.id, "failed to ring bell: {}", e);
        }
    }
}
