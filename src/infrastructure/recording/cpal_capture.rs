//! Microphone capture using cpal
//!
//! The input stream lives on a dedicated thread because `cpal::Stream` is
//! not `Send`. Samples are mixed down to mono 16-bit PCM and handed out as
//! chunks every chunk interval; the first chunk is prefixed with a
//! streaming WAV header.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, PlayStreamError, SampleFormat, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use super::wav_stream;
use crate::application::cancel::CancelToken;
use crate::application::ports::{
    ActiveCapture, AudioCapture, CaptureError, CaptureEvent, CAPTURE_EVENT_BUFFER,
};
use crate::domain::recording::{AudioChunk, Duration};

/// How often the capture thread checks for stop requests
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(20);

type SampleBuffer = Arc<StdMutex<Vec<i16>>>;

/// Audio capture from the default input device
pub struct CpalCapture {
    chunk_interval: StdDuration,
}

impl CpalCapture {
    pub fn new(chunk_interval: Duration) -> Self {
        Self {
            chunk_interval: chunk_interval.as_std(),
        }
    }

    fn get_input_device() -> Result<cpal::Device, CaptureError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(CaptureError::NoAudioDevice)
    }

    /// Pick a stream config at the device's default rate, preferring mono
    fn get_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let default = device.default_input_config().map_err(|e| {
            CaptureError::StartFailed(format!("Failed to get default config: {}", e))
        })?;
        let rate = default.sample_rate();

        let mono = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StartFailed(format!("Failed to get configs: {}", e)))?
            .find(|c| {
                c.channels() == 1
                    && is_supported_format(c.sample_format())
                    && c.min_sample_rate().0 <= rate.0
                    && c.max_sample_rate().0 >= rate.0
            });

        let (channels, sample_format) = match mono {
            Some(range) => (1, range.sample_format()),
            None => (default.channels(), default.sample_format()),
        };

        if !is_supported_format(sample_format) {
            return Err(CaptureError::StartFailed(format!(
                "Unsupported sample format: {}",
                sample_format
            )));
        }

        let config = StreamConfig {
            channels,
            sample_rate: rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    /// Average interleaved frames down to one channel
    fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    }

    fn f32_to_i16(sample: f32) -> i16 {
        (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    }

    /// Open the device and start the stream; returns it with its sample rate
    fn open_stream(buffer: SampleBuffer) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = Self::get_input_device()?;
        let (config, sample_format) = Self::get_input_config(&device)?;
        let channels = config.channels;
        let sample_rate = config.sample_rate.0;

        tracing::debug!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels,
            format = %sample_format,
            "Opening input stream"
        );

        let on_error = |err: cpal::StreamError| tracing::error!(error = %err, "Audio input stream error");

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = Self::mix_to_mono(data, channels);
                    if let Ok(mut pending) = buffer.lock() {
                        pending.extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data.iter().map(|&s| Self::f32_to_i16(s)).collect();
                    let mono = Self::mix_to_mono(&converted, channels);
                    if let Ok(mut pending) = buffer.lock() {
                        pending.extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::StartFailed(format!(
                    "Unsupported sample format: {}",
                    other
                )))
            }
        }
        .map_err(map_build_error)?;

        stream.play().map_err(map_play_error)?;

        Ok((stream, sample_rate))
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new(Duration::default_chunk_interval())
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&self) -> Result<ActiveCapture, CaptureError> {
        let (event_tx, event_rx) = mpsc::channel(CAPTURE_EVENT_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();
        let stop = CancelToken::new();
        let thread_stop = stop.clone();
        let interval = self.chunk_interval;

        std::thread::Builder::new()
            .name("voxpost-capture".to_string())
            .spawn(move || run_capture(event_tx, ready_tx, thread_stop, interval))
            .map_err(|e| CaptureError::StartFailed(format!("Failed to spawn capture thread: {}", e)))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(ActiveCapture::new(event_rx, stop)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::StartFailed(
                "Capture thread exited before starting".to_string(),
            )),
        }
    }
}

/// Capture thread body: report readiness, emit chunks until stopped, then
/// emit the final chunk.
fn run_capture(
    events: mpsc::Sender<CaptureEvent>,
    ready: oneshot::Sender<Result<(), CaptureError>>,
    stop: CancelToken,
    interval: StdDuration,
) {
    let buffer: SampleBuffer = Arc::new(StdMutex::new(Vec::new()));

    let (stream, sample_rate) = match CpalCapture::open_stream(Arc::clone(&buffer)) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut header = match wav_stream::stream_header(sample_rate, 1) {
        Ok(header) => Some(header),
        Err(e) => {
            let _ = ready.send(Err(CaptureError::StartFailed(format!(
                "Failed to build WAV header: {}",
                e
            ))));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        // Nobody is waiting for this capture any more
        return;
    }

    let mut last_emit = Instant::now();
    while !stop.is_cancelled() {
        std::thread::sleep(POLL_INTERVAL.min(interval));
        if last_emit.elapsed() < interval {
            continue;
        }
        last_emit = Instant::now();

        let chunk = take_chunk(&buffer, &mut header);
        if chunk.is_empty() {
            continue;
        }
        if events.blocking_send(CaptureEvent::recording(chunk)).is_err() {
            tracing::debug!("Capture receiver dropped, ending capture");
            return;
        }
    }

    // Stop the device before collecting the tail so nothing arrives late
    drop(stream);

    let chunk = take_chunk(&buffer, &mut header);
    if events.blocking_send(CaptureEvent::last(chunk)).is_err() {
        tracing::debug!("Capture receiver dropped before final chunk");
    }
}

/// Drain the buffered samples into a chunk; the header goes in front of the
/// first chunk only.
fn take_chunk(buffer: &SampleBuffer, header: &mut Option<Vec<u8>>) -> AudioChunk {
    let samples = {
        let mut pending = buffer.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *pending)
    };

    let mut bytes = header.take().unwrap_or_default();
    bytes.extend(wav_stream::encode_samples(&samples));
    AudioChunk::new(bytes)
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::I16 | SampleFormat::F32)
}

fn map_build_error(e: BuildStreamError) -> CaptureError {
    match e {
        BuildStreamError::DeviceNotAvailable => CaptureError::NoAudioDevice,
        // OS-level refusals (e.g. microphone privacy settings) surface here
        BuildStreamError::BackendSpecific { err } => CaptureError::AccessDenied(err.to_string()),
        other => CaptureError::StartFailed(other.to_string()),
    }
}

fn map_play_error(e: PlayStreamError) -> CaptureError {
    match e {
        PlayStreamError::DeviceNotAvailable => CaptureError::NoAudioDevice,
        PlayStreamError::BackendSpecific { err } => CaptureError::AccessDenied(err.to_string()),
    }
}
