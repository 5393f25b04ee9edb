//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod playback;
pub mod uploader;

// Re-export common types
pub use capture::{ActiveCapture, AudioCapture, CaptureError, CaptureEvent, CAPTURE_EVENT_BUFFER};
pub use config::ConfigStore;
pub use playback::{Playback, PlaybackError};
pub use uploader::{UploadError, UploadReceipt, Uploader};
