//! Rodio-based playback adapter
//!
//! Decodes the assembled recording and plays it on the default output.

use std::io::Cursor;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};

use crate::application::ports::{Playback, PlaybackError};
use crate::domain::audio::AudioData;
use crate::infrastructure::recording::wav_stream;

/// Playback through the default output device
pub struct RodioPlayback;

impl RodioPlayback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Playback for RodioPlayback {
    async fn play(&self, audio: &AudioData) -> Result<(), PlaybackError> {
        if audio.is_empty() {
            return Ok(());
        }

        // Streamed WAV carries placeholder lengths; decoders need real ones
        let bytes = wav_stream::seal(audio.data());

        // Run audio playback in blocking thread to avoid blocking the async runtime
        tokio::task::spawn_blocking(move || play_sync(bytes))
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Play the bytes to completion (called from spawn_blocking)
fn play_sync(bytes: Vec<u8>) -> Result<(), PlaybackError> {
    let source =
        Decoder::new(Cursor::new(bytes)).map_err(|e| PlaybackError::DecodeFailed(e.to_string()))?;

    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;

    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}
