//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: cpal capture,
//! HTTP upload, rodio playback and the XDG config file.

pub mod config;
pub mod playback;
pub mod recording;
pub mod upload;

// Re-export adapters
pub use config::XdgConfigStore;
pub use playback::{create_playback, NoOpPlayback, RodioPlayback};
pub use recording::CpalCapture;
pub use upload::HttpUploader;
