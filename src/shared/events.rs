use serde::Serialize;
use uuid::Uuid;

use super::types::HistoryEntry;

/// Change notifications published by the engine.
///
/// Observers receive these over a broadcast channel; each event carries
/// enough to patch a rendered list without re-reading the whole history.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum HistoryEvent {
    #[serde(rename = "history://inserted")]
    Inserted(HistoryEntry),

    #[serde(rename = "history://merged")]
    Merged(HistoryEntry),

    #[serde(rename = "history://pin-toggled")]
    PinToggled(HistoryEntry),

    #[serde(rename = "history://removed")]
    Removed(Uuid),

    #[serde(rename = "history://evicted")]
    Evicted(Vec<Uuid>),

    #[serde(rename = "history://cleared")]
    Cleared,

    #[serde(rename = "clipboard://copied")]
    Copied(Uuid),

    #[serde(rename = "monitor://running")]
    MonitorStateChanged(bool),
}
