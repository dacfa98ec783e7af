//! Clipboard module
//!
//! Watches the system clipboard and keeps a bounded, deduplicated history.
//!
//! - `content`: classifies raw clipboard snapshots into history content
//! - `history`: ordered store with pins, merging and capacity limits
//! - `suppressor`: ignores the clipboard changes the engine makes itself
//! - `watcher`: change detection on each poll
//! - `engine`: ties the above to a backend and publishes events
//! - `monitor`: runs an engine on a tokio task behind a cloneable handle

pub mod backend;
pub mod content;
pub mod engine;
pub mod history;
pub mod monitor;
pub mod suppressor;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{ClipboardBackend, Clock, CopyFeedback};
pub use content::{Content, ContentKind, RawClipboard, RawImage};
pub use engine::ClipboardEngine;
pub use history::{AddOutcome, AddResult, HistoryStore};
pub use monitor::ClipboardMonitor;
