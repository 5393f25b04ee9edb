//! No-op playback adapter
//!
//! Used when playback is disabled.

use async_trait::async_trait;

use crate::application::ports::{Playback, PlaybackError};
use crate::domain::audio::AudioData;

/// Playback that plays nothing
pub struct NoOpPlayback;

impl NoOpPlayback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Playback for NoOpPlayback {
    async fn play(&self, _audio: &AudioData) -> Result<(), PlaybackError> {
        Ok(())
    }
}
