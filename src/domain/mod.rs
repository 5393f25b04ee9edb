//! Domain layer - Core business logic
//!
//! Contains value objects, the recording session entity, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use audio::{AudioData, AudioMimeType};
pub use config::AppConfig;
pub use error::*;
pub use recording::{
    AudioChunk, CaptureState, Duration, InvalidStateTransition, RecorderState, RecordingSession,
    SessionId,
};
