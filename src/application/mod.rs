//! Application layer - Use cases and port interfaces
//!
//! Contains the recorder controller, the cancellation token shared with
//! running operations, and trait definitions for external systems.

pub mod cancel;
pub mod controller;
pub mod ports;

#[cfg(test)]
pub(crate) mod mocks;

// Re-export use cases
pub use cancel::CancelToken;
pub use controller::{
    ControllerConfig, ControllerError, FinishedRecording, PlaybackTask, RecorderController,
    UploadTask,
};
