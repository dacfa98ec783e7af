use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::content::{Content, DedupKey};
use crate::shared::types::{HistoryEntry, SortOrder};

/// Default maximum number of clipboard entries kept
pub const DEFAULT_CAPACITY: usize = 50;

/// Default text preview length
pub const DEFAULT_PREVIEW_CHARS: usize = 50;

/// What `HistoryStore::add` did with the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted(Uuid),
    Merged(Uuid),
}

impl AddOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            AddOutcome::Inserted(id) | AddOutcome::Merged(id) => *id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddResult {
    pub outcome: AddOutcome,
    /// Entries dropped to get back under capacity
    pub evicted: Vec<HistoryEntry>,
}

impl AddResult {
    /// False when the added entry was itself evicted
    pub fn retained(&self) -> bool {
        let id = self.outcome.id();
        !self.evicted.iter().any(|e| e.id == id)
    }
}

/// In-memory clipboard history
///
/// Entries are kept sorted: pinned first, then by last copy time in the
/// configured direction. Content is unique per dedup key.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    capacity: usize,
    sort_order: SortOrder,
    preview_chars: usize,
}

impl HistoryStore {
    pub fn new(capacity: usize, sort_order: SortOrder) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            sort_order,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars.max(1);
        self
    }

    /// Record a copy of `content` at `now`, merging into an existing entry when possible
    pub fn add(&mut self, content: Content, now: DateTime<Utc>) -> AddResult {
        let key = content.dedup_key();
        let outcome = match self.position_of(&key) {
            Some(index) => {
                let mut entry = self.entries.remove(index);
                entry.touch(now);
                let id = entry.id;
                debug!(%id, copy_count = entry.copy_count, "merged duplicate clipboard entry");
                self.entries.insert(0, entry);
                AddOutcome::Merged(id)
            }
            None => {
                let entry = HistoryEntry::new(content, now, self.preview_chars);
                let id = entry.id;
                self.entries.insert(0, entry);
                AddOutcome::Inserted(id)
            }
        };

        self.sort();
        let evicted = self.enforce_capacity();
        AddResult { outcome, evicted }
    }

    /// Flip the pin state; returns the new state
    pub fn toggle_pin(&mut self, id: Uuid) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.pinned = !entry.pinned;
        let pinned = entry.pinned;
        self.sort();
        Some(pinned)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let removed = self.entries.remove(index);
        self.sort();
        Some(removed)
    }

    /// Drop every entry, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether some entry holds exactly this text
    pub fn contains_text(&self, text: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(&e.content, Content::Text(t) if t == text))
    }

    /// Entries in display order
    pub fn items(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    fn position_of(&self, key: &DedupKey) -> Option<usize> {
        self.entries.iter().position(|e| &e.content.dedup_key() == key)
    }

    fn sort(&mut self) {
        let order = self.sort_order;
        // Stable: equal timestamps keep their current relative order
        self.entries.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| order.compare(&a.last_copied, &b.last_copied))
        });
    }

    /// Evict least-recently-copied unpinned entries until within capacity
    fn enforce_capacity(&mut self) -> Vec<HistoryEntry> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            // Oldest unpinned; on equal times the one further down the list goes
            let victim = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.pinned)
                .min_by(|(ia, a), (ib, b)| a.last_copied.cmp(&b.last_copied).then(ib.cmp(ia)))
                .map(|(index, _)| index);

            match victim {
                Some(index) => evicted.push(self.entries.remove(index)),
                // Everything left is pinned
                None => break,
            }
        }
        evicted
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, SortOrder::default())
    }
}
