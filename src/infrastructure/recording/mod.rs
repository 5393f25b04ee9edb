//! Recording infrastructure module
//!
//! Captures microphone audio with cpal and frames it as a streaming WAV.

mod cpal_capture;
pub mod wav_stream;

pub use cpal_capture::CpalCapture;
