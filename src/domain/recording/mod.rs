//! Recording domain module

mod chunk;
mod duration;
mod session;

pub use chunk::AudioChunk;
pub use duration::Duration;
pub use session::{
    CaptureState, InvalidStateTransition, RecorderState, RecordingSession, SessionId,
};
