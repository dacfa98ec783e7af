pub mod errors;
pub mod events;
pub mod settings;
pub mod types;

// Re-export the error types for convenience
pub use errors::{ClipboardError, EngineError, EngineResult, SettingsError};
