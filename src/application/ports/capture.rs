//! Audio capture port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::cancel::CancelToken;
use crate::domain::recording::{AudioChunk, CaptureState};

/// Capacity of the channel carrying capture events to the session task
pub const CAPTURE_EVENT_BUFFER: usize = 64;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Microphone access denied: {0}")]
    AccessDenied(String),

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Capture ended before delivering its final chunk")]
    StreamClosed,

    #[error("Capture task failed: {0}")]
    TaskFailed(String),
}

/// A chunk that became available, with the capture state at that moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub chunk: AudioChunk,
    pub state: CaptureState,
}

impl CaptureEvent {
    /// A chunk emitted while capture is still running
    pub fn recording(chunk: AudioChunk) -> Self {
        Self {
            chunk,
            state: CaptureState::Recording,
        }
    }

    /// The last chunk of a capture, emitted after it went inactive
    pub fn last(chunk: AudioChunk) -> Self {
        Self {
            chunk,
            state: CaptureState::Inactive,
        }
    }

    pub fn is_final(&self) -> bool {
        self.state == CaptureState::Inactive
    }
}

/// Handle to a running capture.
///
/// Events arrive in capture order. After [`ActiveCapture::request_stop`] the
/// capture flushes what it still holds as one final event whose state is
/// [`CaptureState::Inactive`] and then closes the channel. Dropping the
/// handle stops the capture as well.
#[derive(Debug)]
pub struct ActiveCapture {
    events: mpsc::Receiver<CaptureEvent>,
    stop: CancelToken,
}

impl ActiveCapture {
    pub fn new(events: mpsc::Receiver<CaptureEvent>, stop: CancelToken) -> Self {
        Self { events, stop }
    }

    /// Token that ends the capture when cancelled
    pub fn stop_token(&self) -> CancelToken {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Wait for the next event; `None` once the capture has closed its channel
    pub async fn next_event(&mut self) -> Option<CaptureEvent> {
        self.events.recv().await
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Port for microphone capture
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Request access to the audio input and begin capturing.
    ///
    /// # Returns
    /// A handle delivering chunk events, or the reason access failed
    async fn start(&self) -> Result<ActiveCapture, CaptureError>;
}
