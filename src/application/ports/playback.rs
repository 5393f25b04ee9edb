//! Playback port for hearing a recording back locally

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;

/// Errors that can occur during playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// No audio output device available
    #[error("Audio output not available: {0}")]
    DeviceNotAvailable(String),

    /// The recording could not be decoded
    #[error("Could not decode recording: {0}")]
    DecodeFailed(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Port trait for local playback
#[async_trait]
pub trait Playback: Send + Sync {
    /// Play the recording to completion
    async fn play(&self, audio: &AudioData) -> Result<(), PlaybackError>;
}
