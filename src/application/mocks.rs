//! Port mocks shared by the controller and interactive loop tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::cancel::CancelToken;
use crate::application::ports::{
    ActiveCapture, AudioCapture, CaptureError, CaptureEvent, Playback, PlaybackError,
    UploadError, UploadReceipt, Uploader, CAPTURE_EVENT_BUFFER,
};
use crate::domain::audio::AudioData;
use crate::domain::recording::AudioChunk;

/// What one capture emits
#[derive(Clone)]
pub(crate) struct Script {
    pub chunks: Vec<&'static str>,
    pub last: &'static str,
    pub last_delay: StdDuration,
    pub send_last: bool,
}

impl Script {
    pub fn new(chunks: &[&'static str], last: &'static str) -> Self {
        Self {
            chunks: chunks.to_vec(),
            last,
            last_delay: StdDuration::ZERO,
            send_last: true,
        }
    }
}

/// Capture that replays one script per start
pub(crate) struct ScriptedCapture {
    scripts: StdMutex<VecDeque<Script>>,
    deny: bool,
    /// How long `start` takes to grant access
    pub start_delay: StdDuration,
    /// Stop tokens of every capture handed out, in start order
    pub stops: Arc<StdMutex<Vec<CancelToken>>>,
}

impl ScriptedCapture {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: StdMutex::new(scripts.into()),
            deny: false,
            start_delay: StdDuration::ZERO,
            stops: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl AudioCapture for ScriptedCapture {
    async fn start(&self) -> Result<ActiveCapture, CaptureError> {
        tokio::time::sleep(self.start_delay).await;
        if self.deny {
            return Err(CaptureError::AccessDenied("permission denied".into()));
        }
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::new(&[], ""));

        let (tx, rx) = mpsc::channel(CAPTURE_EVENT_BUFFER);
        let stop = CancelToken::new();
        let token = stop.clone();
        self.stops.lock().unwrap().push(stop.clone());

        tokio::spawn(async move {
            for chunk in script.chunks {
                if tx
                    .send(CaptureEvent::recording(AudioChunk::from(chunk.as_bytes())))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            token.cancelled().await;
            tokio::time::sleep(script.last_delay).await;
            if script.send_last {
                let _ = tx
                    .send(CaptureEvent::last(AudioChunk::from(script.last.as_bytes())))
                    .await;
            }
        });

        Ok(ActiveCapture::new(rx, stop))
    }
}

/// Uploader that records every body it is given
#[derive(Clone)]
pub(crate) struct RecordingUploader {
    pub bodies: Arc<StdMutex<Vec<AudioData>>>,
    pub status: u16,
    pub delay: StdDuration,
}

impl RecordingUploader {
    pub fn answering(status: u16) -> Self {
        Self {
            bodies: Arc::new(StdMutex::new(Vec::new())),
            status,
            delay: StdDuration::ZERO,
        }
    }

    pub fn calls(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, audio: &AudioData) -> Result<UploadReceipt, UploadError> {
        self.bodies.lock().unwrap().push(audio.clone());
        tokio::time::sleep(self.delay).await;
        if self.status == 200 {
            Ok(UploadReceipt {
                status: 200,
                bytes_sent: audio.size_bytes(),
            })
        } else {
            Err(UploadError::Rejected {
                status: self.status,
                body: String::new(),
            })
        }
    }

    fn endpoint(&self) -> String {
        "mock://upload".to_string()
    }
}

/// Playback that counts plays and finishes after `delay`
#[derive(Clone, Default)]
pub(crate) struct CountingPlayback {
    pub plays: Arc<AtomicUsize>,
    pub finished: Arc<AtomicUsize>,
    pub fail: bool,
    pub delay: StdDuration,
}

impl CountingPlayback {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Playback for CountingPlayback {
    async fn play(&self, _audio: &AudioData) -> Result<(), PlaybackError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PlaybackError::DeviceNotAvailable("no speakers".into()))
        } else {
            Ok(())
        }
    }
}
