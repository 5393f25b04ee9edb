//! Playback infrastructure adapters
//!
//! Plays each finished recording back on the local output device.

mod noop;
mod rodio;

pub use noop::NoOpPlayback;
pub use rodio::RodioPlayback;

use async_trait::async_trait;

use crate::application::ports::{Playback, PlaybackError};
use crate::domain::audio::AudioData;

/// Create a playback adapter based on whether playback is enabled
pub fn create_playback(enabled: bool) -> Box<dyn Playback> {
    if enabled {
        Box::new(RodioPlayback::new())
    } else {
        Box::new(NoOpPlayback::new())
    }
}

#[async_trait]
impl Playback for Box<dyn Playback> {
    async fn play(&self, audio: &AudioData) -> Result<(), PlaybackError> {
        (**self).play(audio).await
    }
}
