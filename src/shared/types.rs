use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::core::clipboard::content::{Content, ContentKind};

/// Direction in which entries are ordered by their last copy time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    /// Compare two copy times according to this direction
    pub fn compare(self, a: &DateTime<Utc>, b: &DateTime<Utc>) -> Ordering {
        match self {
            SortOrder::NewestFirst => b.cmp(a),
            SortOrder::OldestFirst => a.cmp(b),
        }
    }
}

/// A single clipboard history entry
///
/// Identity is the `id` alone: two entries holding the same content are still
/// different entries. The history never keeps two such entries at once, since
/// duplicates are merged into the existing one.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub content: Content,
    pub preview: String, // Truncated preview for display
    pub first_copied: DateTime<Utc>,
    pub last_copied: DateTime<Utc>,
    pub copy_count: u32,
    pub pinned: bool,
}

impl HistoryEntry {
    /// Create a fresh entry for content first seen at `now`
    pub fn new(content: Content, now: DateTime<Utc>, preview_chars: usize) -> Self {
        let preview = content.preview(preview_chars);
        Self {
            id: Uuid::new_v4(),
            content,
            preview,
            first_copied: now,
            last_copied: now,
            copy_count: 1,
            pinned: false,
        }
    }

    /// Record another copy of the same content
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_copied = now;
        self.copy_count = self.copy_count.saturating_add(1);
    }

    /// Display kind; checks the filesystem for single files
    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }

    /// Relative description of when this entry was last copied
    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let secs = (now - self.last_copied).num_seconds().max(0);
        if secs < 60 {
            "Just now".to_string()
        } else if secs < 3_600 {
            format!("{}m ago", secs / 60)
        } else if secs < 86_400 {
            format!("{}h ago", secs / 3_600)
        } else if secs < 604_800 {
            format!("{}d ago", secs / 86_400)
        } else {
            self.last_copied.format("%Y-%m-%d %H:%M").to_string()
        }
    }
}

impl PartialEq for HistoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HistoryEntry {}

impl Hash for HistoryEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
