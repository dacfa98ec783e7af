//! Clipboard history engine
//!
//! Polls the system clipboard, classifies what was copied and keeps a
//! bounded history that can be pinned, pruned and copied back.

pub mod core;
pub mod logging;
pub mod shared;
pub mod system;

pub use crate::core::clipboard::{ClipboardEngine, ClipboardMonitor, Content, ContentKind, HistoryStore};
pub use crate::shared::events::HistoryEvent;
pub use crate::shared::settings::EngineSettings;
pub use crate::shared::types::{HistoryEntry, SortOrder};
pub use crate::system::clipboard::ArboardClipboard;
