//! Error types for the clipboard engine
//!
//! Every failure in the engine maps onto one of these enums. All variants are
//! serializable so a UI shell can forward them over IPC unchanged.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Failures talking to the system clipboard.
///
/// None of these are fatal: the watcher skips the tick and tries again on the
/// next one.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ClipboardError {
    /// The platform clipboard could not be opened
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    /// Reading from the clipboard failed
    #[error("Clipboard read failed: {0}")]
    Read(String),

    /// Writing to (or clearing) the clipboard failed
    #[error("Clipboard write failed: {0}")]
    Write(String),
}

impl From<arboard::Error> for ClipboardError {
    fn from(err: arboard::Error) -> Self {
        match err {
            arboard::Error::ClipboardNotSupported | arboard::Error::ClipboardOccupied => {
                ClipboardError::Unavailable(err.to_string())
            }
            other => ClipboardError::Read(other.to_string()),
        }
    }
}

/// Errors surfaced by engine operations the UI invokes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum EngineError {
    /// No history entry carries this id
    #[error("History entry not found: {0}")]
    EntryNotFound(Uuid),

    /// The clipboard rejected the operation
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    /// The monitor task has shut down and no longer accepts commands
    #[error("Clipboard monitor is no longer running")]
    MonitorClosed,
}

/// Errors loading or saving engine settings.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum SettingsError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Settings I/O error: {0}")]
    Io(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Parse(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
