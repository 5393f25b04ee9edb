//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::audio::AudioMimeType;
use crate::domain::recording::Duration;

/// Default server the recording is uploaded to
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Default upload path on the server
pub const DEFAULT_UPLOAD_PATH: &str = "/upload";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub upload_path: Option<String>,
    pub content_type: Option<String>,
    pub timeout: Option<String>,
    pub chunk_interval: Option<String>,
    pub max_duration: Option<String>,
    pub playback: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            upload_path: Some(DEFAULT_UPLOAD_PATH.to_string()),
            content_type: Some(AudioMimeType::default().to_string()),
            timeout: Some(Duration::default_upload_timeout().to_string()),
            chunk_interval: Some(Duration::default_chunk_interval().to_string()),
            max_duration: Some(Duration::default_max_duration().to_string()),
            playback: Some(true),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            upload_path: other.upload_path.or(self.upload_path),
            content_type: other.content_type.or(self.content_type),
            timeout: other.timeout.or(self.timeout),
            chunk_interval: other.chunk_interval.or(self.chunk_interval),
            max_duration: other.max_duration.or(self.max_duration),
            playback: other.playback.or(self.playback),
        }
    }

    pub fn server_url_or_default(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn upload_path_or_default(&self) -> &str {
        self.upload_path.as_deref().unwrap_or(DEFAULT_UPLOAD_PATH)
    }

    /// Get content type, or `audio/mpeg` if not set/invalid
    pub fn content_type_or_default(&self) -> AudioMimeType {
        self.content_type
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn timeout_or_default(&self) -> Duration {
        self.timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_upload_timeout)
    }

    pub fn chunk_interval_or_default(&self) -> Duration {
        self.chunk_interval
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_chunk_interval)
    }

    pub fn max_duration_or_default(&self) -> Duration {
        self.max_duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_max_duration)
    }

    /// Get playback setting, or true if not set
    pub fn playback_or_default(&self) -> bool {
        self.playback.unwrap_or(true)
    }
}
