use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::warn;

use super::errors::SettingsError;
use super::types::SortOrder;

const MIN_POLL_INTERVAL_MS: u64 = 50;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const MAX_CAPACITY: usize = 10_000;

/// Tunables for the clipboard engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Delay between clipboard polls. Lower values detect copies sooner at the
    /// cost of more wake-ups.
    pub poll_interval_ms: u64,
    /// Maximum number of history entries kept in memory
    pub capacity: usize,
    pub sort_order: SortOrder,
    /// Self-write suppression after writing text or an image
    pub text_suppression_ms: u64,
    /// Self-write suppression after writing files; file-backed writes echo back slower
    pub file_suppression_ms: u64,
    /// Characters kept in a text preview before it is truncated
    pub preview_chars: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            capacity: 50,
            sort_order: SortOrder::NewestFirst,
            text_suppression_ms: 1_000,
            file_suppression_ms: 1_500,
            preview_chars: 50,
        }
    }
}

impl EngineSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn text_suppression(&self) -> Duration {
        Duration::from_millis(self.text_suppression_ms)
    }

    pub fn file_suppression(&self) -> Duration {
        Duration::from_millis(self.file_suppression_ms)
    }

    /// Clamp out-of-range values, logging each correction
    pub fn validated(mut self) -> Self {
        let poll = self
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        if poll != self.poll_interval_ms {
            warn!(requested = self.poll_interval_ms, using = poll, "poll interval out of range");
            self.poll_interval_ms = poll;
        }

        let capacity = self.capacity.clamp(1, MAX_CAPACITY);
        if capacity != self.capacity {
            warn!(requested = self.capacity, using = capacity, "history capacity out of range");
            self.capacity = capacity;
        }

        if self.preview_chars == 0 {
            warn!("preview length of 0 is not usable, falling back to default");
            self.preview_chars = Self::default().preview_chars;
        }

        self
    }

    pub fn get_settings_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("com", "clipkeep", "clipkeep")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Load settings from the platform config directory
    pub async fn load() -> Result<Self, SettingsError> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    /// Load settings from `path`, writing the defaults there when it does not exist yet
    pub async fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !fs::try_exists(path).await? {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path).await?;
        let settings: Self = serde_json::from_str(&content)?;
        Ok(settings.validated())
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = EngineSettings::load_from(&path).await.unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "capacity": 10, "sort_order": "oldest_first" }"#).unwrap();

        let settings = EngineSettings::load_from(&path).await.unwrap();
        assert_eq!(settings.capacity, 10);
        assert_eq!(settings.sort_order, SortOrder::OldestFirst);
        assert_eq!(settings.poll_interval_ms, 500);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ capacity: }").unwrap();

        let err = EngineSettings::load_from(&path).await.unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_validated_clamps() {
        let settings = EngineSettings {
            poll_interval_ms: 1,
            capacity: 0,
            preview_chars: 0,
            ..EngineSettings::default()
        }
        .validated();
        assert_eq!(settings.poll_interval_ms, MIN_POLL_INTERVAL_MS);
        assert_eq!(settings.capacity, 1);
        assert_eq!(settings.preview_chars, 50);
    }
}
