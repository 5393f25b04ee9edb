//! Recording session entity and recorder states

use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use thiserror::Error;
use uuid::Uuid;

use super::chunk::AudioChunk;
use crate::domain::audio::{AudioData, AudioMimeType};

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
}

impl RecorderState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capture state observed when a chunk became available.
/// `Inactive` marks the final chunk of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Recording,
    Inactive,
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: String,
}

/// Identifier of one recording session, used to correlate log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One capture session: the chunks collected between a start and its stop.
///
/// A session is created empty for every start and consumed by
/// [`RecordingSession::assemble`], so its chunks can never leak into a later
/// session or be assembled twice.
#[derive(Debug)]
pub struct RecordingSession {
    id: SessionId,
    chunks: Vec<AudioChunk>,
    started_at: Instant,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            chunks: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Append a chunk in arrival order
    pub fn append(&mut self, chunk: AudioChunk) {
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of captured bytes across all chunks
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(AudioChunk::len).sum()
    }

    pub fn elapsed(&self) -> StdDuration {
        self.started_at.elapsed()
    }

    /// Concatenate every chunk, in arrival order, into one recording
    pub fn assemble(self, mime_type: AudioMimeType) -> AudioData {
        let mut data = Vec::with_capacity(self.byte_len());
        for chunk in &self.chunks {
            data.extend_from_slice(chunk.as_bytes());
        }
        AudioData::new(data, mime_type)
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
