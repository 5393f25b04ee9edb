//! Record / stop / upload use case

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::domain::audio::{AudioData, AudioMimeType};
use crate::domain::recording::{
    InvalidStateTransition, RecorderState, RecordingSession, SessionId,
};

use super::cancel::CancelToken;
use super::ports::{
    ActiveCapture, AudioCapture, CaptureError, Playback, UploadError, UploadReceipt, Uploader,
};

/// Errors from the recorder controller
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

/// Settings for the controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Content type the assembled recording is declared as
    pub content_type: AudioMimeType,
    /// Whether to play each recording back after it is assembled
    pub playback: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            content_type: AudioMimeType::default(),
            playback: true,
        }
    }
}

/// An upload running in the background.
///
/// Stopping or restarting a recording never aborts it; only
/// [`UploadTask::cancel`] does.
#[derive(Debug)]
pub struct UploadTask {
    session_id: SessionId,
    cancel: CancelToken,
    handle: JoinHandle<Result<UploadReceipt, UploadError>>,
}

impl UploadTask {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the upload outcome
    pub async fn wait(self) -> Result<UploadReceipt, UploadError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(UploadError::RequestFailed(format!(
                "Upload task failed: {}",
                e
            ))),
        }
    }
}

/// Local playback of a finished recording, running in the background.
/// Failures are logged by the task itself.
#[derive(Debug)]
pub struct PlaybackTask {
    handle: JoinHandle<()>,
}

impl PlaybackTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the recording has been played to the end
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            tracing::debug!(error = %e, "Playback task ended abnormally");
        }
    }
}

/// Result of stopping a recording
#[derive(Debug)]
pub struct FinishedRecording {
    pub session_id: SessionId,
    /// The assembled recording, exactly as uploaded
    pub audio: AudioData,
    pub upload: UploadTask,
    /// `None` when playback is disabled
    pub playback: Option<PlaybackTask>,
}

struct ActiveSession {
    id: SessionId,
    stop: CancelToken,
    task: JoinHandle<Result<AudioData, CaptureError>>,
    started_at: Instant,
}

/// Drives the idle/recording lifecycle.
///
/// State machine:
///   IDLE -> RECORDING (start, once the capture grants access)
///   RECORDING -> IDLE (stop: assemble, upload, play back)
///   RECORDING -> IDLE (cancel: discard)
pub struct RecorderController<C, U, P>
where
    C: AudioCapture,
    U: Uploader + 'static,
    P: Playback + 'static,
{
    capture: C,
    uploader: Arc<U>,
    playback: Arc<P>,
    config: ControllerConfig,
    active: Mutex<Option<ActiveSession>>,
    /// Serializes `start` while the capture is being opened, so `active`
    /// stays free for `state` and `elapsed` during a permission prompt
    starting: Mutex<()>,
}

impl<C, U, P> RecorderController<C, U, P>
where
    C: AudioCapture,
    U: Uploader + 'static,
    P: Playback + 'static,
{
    pub fn new(capture: C, uploader: U, playback: P, config: ControllerConfig) -> Self {
        Self {
            capture,
            uploader: Arc::new(uploader),
            playback: Arc::new(playback),
            config,
            active: Mutex::new(None),
            starting: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> RecorderState {
        if self.active.lock().await.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Id of the session currently recording, if any
    pub async fn active_session(&self) -> Option<SessionId> {
        self.active.lock().await.as_ref().map(|s| s.id)
    }

    /// Time since the active session started, if any
    pub async fn elapsed(&self) -> Option<StdDuration> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|s| s.started_at.elapsed())
    }

    /// Request microphone access and begin a fresh session
    pub async fn start(&self) -> Result<SessionId, ControllerError> {
        let _starting = self.starting.lock().await;
        if self.active.lock().await.is_some() {
            return Err(InvalidStateTransition {
                current_state: RecorderState::Recording,
                action: "start recording".to_string(),
            }
            .into());
        }

        let capture = match self.capture.start().await {
            Ok(capture) => capture,
            Err(e) => {
                tracing::error!(error = %e, "Could not start capture");
                return Err(e.into());
            }
        };

        let session = RecordingSession::new();
        let id = session.id();
        let stop = capture.stop_token();
        let task = tokio::spawn(collect_session(session, capture, self.config.content_type));

        tracing::info!(session = %id, "Recording started");
        *self.active.lock().await = Some(ActiveSession {
            id,
            stop,
            task,
            started_at: Instant::now(),
        });

        Ok(id)
    }

    /// End the active capture, assemble its chunks, then dispatch the upload
    /// and the local playback as background tasks.
    ///
    /// Assembly waits for the capture's final chunk; the controller is idle
    /// again as soon as this is called, so a new session may start while
    /// the previous upload or playback is still running.
    pub async fn stop(&self) -> Result<FinishedRecording, ControllerError> {
        let active = self.take_active("stop recording").await?;
        let id = active.id;
        active.stop.cancel();

        let audio = join_session(active.task).await.inspect_err(|e| {
            tracing::error!(session = %id, error = %e, "Recording lost");
        })?;

        tracing::info!(
            session = %id,
            bytes = audio.size_bytes(),
            content_type = %audio.mime_type(),
            "Recording assembled"
        );

        let upload = self.dispatch_upload(id, audio.clone());
        let playback = self
            .config
            .playback
            .then(|| self.dispatch_playback(id, audio.clone()));

        Ok(FinishedRecording {
            session_id: id,
            audio,
            upload,
            playback,
        })
    }

    /// End the active capture and discard everything it collected
    pub async fn cancel(&self) -> Result<SessionId, ControllerError> {
        let active = self.take_active("cancel recording").await?;
        active.stop.cancel();

        // Let the capture release the device before returning
        if let Err(e) = join_session(active.task).await {
            tracing::debug!(session = %active.id, error = %e, "Cancelled capture ended with error");
        }

        tracing::info!(session = %active.id, "Recording cancelled");
        Ok(active.id)
    }

    async fn take_active(&self, action: &str) -> Result<ActiveSession, InvalidStateTransition> {
        self.active
            .lock()
            .await
            .take()
            .ok_or_else(|| InvalidStateTransition {
                current_state: RecorderState::Idle,
                action: action.to_string(),
            })
    }

    fn dispatch_upload(&self, session_id: SessionId, audio: AudioData) -> UploadTask {
        let uploader = Arc::clone(&self.uploader);
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                session = %session_id,
                endpoint = %uploader.endpoint(),
                bytes = audio.size_bytes(),
                "Uploading recording"
            );

            let result = tokio::select! {
                result = uploader.upload(&audio) => result,
                _ = token.cancelled() => Err(UploadError::Cancelled),
            };

            match &result {
                Ok(receipt) => tracing::info!(
                    session = %session_id,
                    status = receipt.status,
                    "Audio uploaded successfully"
                ),
                Err(e) => tracing::error!(session = %session_id, error = %e, "Audio upload failed"),
            }

            result
        });

        UploadTask {
            session_id,
            cancel,
            handle,
        }
    }

    fn dispatch_playback(&self, session_id: SessionId, audio: AudioData) -> PlaybackTask {
        let playback = Arc::clone(&self.playback);

        let handle = tokio::spawn(async move {
            match playback.play(&audio).await {
                Ok(()) => tracing::debug!(session = %session_id, "Playback finished"),
                Err(e) => tracing::warn!(session = %session_id, error = %e, "Playback failed"),
            }
        });

        PlaybackTask { handle }
    }
}

/// Append every chunk to the session until the capture's final chunk, then
/// assemble.
async fn collect_session(
    mut session: RecordingSession,
    mut capture: ActiveCapture,
    content_type: AudioMimeType,
) -> Result<AudioData, CaptureError> {
    while let Some(event) = capture.next_event().await {
        let last = event.is_final();
        tracing::debug!(
            session = %session.id(),
            bytes = event.chunk.len(),
            last,
            "Chunk available"
        );
        session.append(event.chunk);

        if last {
            tracing::debug!(
                session = %session.id(),
                chunks = session.chunk_count(),
                elapsed_ms = session.elapsed().as_millis() as u64,
                "Capture inactive"
            );
            return Ok(session.assemble(content_type));
        }
    }

    Err(CaptureError::StreamClosed)
}

async fn join_session(
    task: JoinHandle<Result<AudioData, CaptureError>>,
) -> Result<AudioData, CaptureError> {
    task.await
        .map_err(|e| CaptureError::TaskFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mocks::{CountingPlayback, RecordingUploader, Script, ScriptedCapture};

    fn controller(
        capture: ScriptedCapture,
        uploader: RecordingUploader,
        playback: CountingPlayback,
    ) -> RecorderController<ScriptedCapture, RecordingUploader, CountingPlayback> {
        RecorderController::new(capture, uploader, playback, ControllerConfig::default())
    }

    #[tokio::test]
    async fn stop_uploads_chunks_concatenated_in_order() {
        let uploader = RecordingUploader::answering(200);
        let playback = CountingPlayback::default();
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A", "B", "C"], "")]),
            uploader.clone(),
            playback.clone(),
        );

        ctrl.start().await.unwrap();
        assert_eq!(ctrl.state().await, RecorderState::Recording);

        let finished = ctrl.stop().await.unwrap();
        assert_eq!(ctrl.state().await, RecorderState::Idle);
        assert_eq!(finished.audio.data(), b"ABC");
        assert_eq!(finished.audio.mime_type(), AudioMimeType::Mpeg);

        let receipt = finished.upload.wait().await.unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.bytes_sent, 3);

        finished.playback.expect("playback enabled").wait().await;
        assert_eq!(playback.plays(), 1);

        let bodies = uploader.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].data(), b"ABC");
    }

    #[tokio::test]
    async fn stop_waits_for_delayed_final_chunk() {
        let mut script = Script::new(&["A", "B", "C"], "D");
        script.last_delay = StdDuration::from_millis(50);
        let ctrl = controller(
            ScriptedCapture::new(vec![script]),
            RecordingUploader::answering(200),
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        let finished = ctrl.stop().await.unwrap();

        assert_eq!(finished.audio.data(), b"ABCD");
    }

    #[tokio::test]
    async fn denied_access_creates_no_session_and_no_upload() {
        let uploader = RecordingUploader::answering(200);
        let ctrl = controller(
            ScriptedCapture::denied(),
            uploader.clone(),
            CountingPlayback::default(),
        );

        let err = ctrl.start().await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Capture(CaptureError::AccessDenied(_))
        ));
        assert_eq!(ctrl.state().await, RecorderState::Idle);
        assert!(ctrl.active_session().await.is_none());
        assert_eq!(uploader.calls(), 0);
    }

    #[tokio::test]
    async fn nothing_is_uploaded_while_recording() {
        let uploader = RecordingUploader::answering(200);
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A", "B"], "C")]),
            uploader.clone(),
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        assert_eq!(uploader.calls(), 0);

        ctrl.stop().await.unwrap().upload.wait().await.unwrap();
        assert_eq!(uploader.calls(), 1);
    }

    #[tokio::test]
    async fn each_session_starts_from_empty_chunks() {
        let uploader = RecordingUploader::answering(200);
        let ctrl = controller(
            ScriptedCapture::new(vec![
                Script::new(&["A", "B"], ""),
                Script::new(&["X"], "Y"),
            ]),
            uploader.clone(),
            CountingPlayback::default(),
        );

        let first_id = ctrl.start().await.unwrap();
        let first = ctrl.stop().await.unwrap();
        let second_id = ctrl.start().await.unwrap();
        let second = ctrl.stop().await.unwrap();

        assert_ne!(first_id, second_id);
        assert_eq!(first.audio.data(), b"AB");
        assert_eq!(second.audio.data(), b"XY");
    }

    #[tokio::test]
    async fn start_while_recording_is_rejected() {
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], "")]),
            RecordingUploader::answering(200),
            CountingPlayback::default(),
        );

        let id = ctrl.start().await.unwrap();
        let err = ctrl.start().await.unwrap_err();

        match err {
            ControllerError::InvalidState(e) => {
                assert_eq!(e.current_state, RecorderState::Recording)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctrl.active_session().await, Some(id));
    }

    #[tokio::test]
    async fn stop_while_idle_is_rejected() {
        let ctrl = controller(
            ScriptedCapture::new(Vec::new()),
            RecordingUploader::answering(200),
            CountingPlayback::default(),
        );

        let err = ctrl.stop().await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidState(_)));
    }

    #[tokio::test]
    async fn rejected_upload_is_reported() {
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], "")]),
            RecordingUploader::answering(500),
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        let err = ctrl.stop().await.unwrap().upload.wait().await.unwrap_err();

        assert!(matches!(err, UploadError::Rejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn cancel_discards_the_session() {
        let uploader = RecordingUploader::answering(200);
        let playback = CountingPlayback::default();
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], "B")]),
            uploader.clone(),
            playback.clone(),
        );

        let id = ctrl.start().await.unwrap();
        assert_eq!(ctrl.cancel().await.unwrap(), id);

        assert_eq!(ctrl.state().await, RecorderState::Idle);
        assert_eq!(uploader.calls(), 0);
        assert_eq!(playback.plays(), 0);
    }

    #[tokio::test]
    async fn closed_capture_without_final_chunk_uploads_nothing() {
        let uploader = RecordingUploader::answering(200);
        let mut script = Script::new(&["A"], "");
        script.send_last = false;
        let ctrl = controller(
            ScriptedCapture::new(vec![script]),
            uploader.clone(),
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        let err = ctrl.stop().await.unwrap_err();

        assert!(matches!(
            err,
            ControllerError::Capture(CaptureError::StreamClosed)
        ));
        assert_eq!(ctrl.state().await, RecorderState::Idle);
        assert_eq!(uploader.calls(), 0);
    }

    #[tokio::test]
    async fn upload_can_be_cancelled() {
        let mut uploader = RecordingUploader::answering(200);
        uploader.delay = StdDuration::from_secs(30);
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], "")]),
            uploader,
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        let finished = ctrl.stop().await.unwrap();
        finished.upload.cancel();

        let err = finished.upload.wait().await.unwrap_err();
        assert!(matches!(err, UploadError::Cancelled));
    }

    #[tokio::test]
    async fn new_session_may_start_while_upload_in_flight() {
        let mut uploader = RecordingUploader::answering(200);
        uploader.delay = StdDuration::from_millis(100);
        let ctrl = controller(
            ScriptedCapture::new(vec![
                Script::new(&["A"], ""),
                Script::new(&["B"], ""),
            ]),
            uploader,
            CountingPlayback::default(),
        );

        ctrl.start().await.unwrap();
        let first = ctrl.stop().await.unwrap();
        ctrl.start().await.unwrap();

        assert_eq!(ctrl.state().await, RecorderState::Recording);
        assert!(first.upload.wait().await.is_ok());
    }

    #[tokio::test]
    async fn playback_failure_does_not_block_upload() {
        let playback = CountingPlayback {
            fail: true,
            ..Default::default()
        };
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], "")]),
            RecordingUploader::answering(200),
            playback,
        );

        ctrl.start().await.unwrap();
        let finished = ctrl.stop().await.unwrap();

        finished.playback.expect("playback enabled").wait().await;
        assert!(finished.upload.wait().await.is_ok());
    }

    #[tokio::test]
    async fn stop_returns_while_playback_is_still_running() {
        let playback = CountingPlayback {
            delay: StdDuration::from_millis(800),
            ..Default::default()
        };
        let ctrl = controller(
            ScriptedCapture::new(vec![Script::new(&["A"], ""), Script::new(&["B"], "")]),
            RecordingUploader::answering(200),
            playback.clone(),
        );

        ctrl.start().await.unwrap();
        let finished = tokio::time::timeout(StdDuration::from_millis(200), ctrl.stop())
            .await
            .expect("stop waited for playback")
            .unwrap();
        let playing = finished.playback.expect("playback enabled");
        assert!(!playing.is_finished());

        ctrl.start().await.unwrap();
        assert_eq!(ctrl.state().await, RecorderState::Recording);
        assert_eq!(playback.finished(), 0);

        playing.wait().await;
        assert_eq!(playback.finished(), 1);
        assert!(finished.upload.wait().await.is_ok());
    }

    #[tokio::test]
    async fn state_is_readable_while_capture_is_starting() {
        let mut capture = ScriptedCapture::new(vec![Script::new(&["A"], "")]);
        capture.start_delay = StdDuration::from_millis(300);
        let ctrl = controller(
            capture,
            RecordingUploader::answering(200),
            CountingPlayback::default(),
        );

        let (started, observed) = tokio::join!(ctrl.start(), async {
            tokio::time::sleep(StdDuration::from_millis(50)).await;
            tokio::time::timeout(StdDuration::from_millis(100), ctrl.state()).await
        });

        assert!(started.is_ok());
        assert_eq!(
            observed.expect("state blocked by a starting capture"),
            RecorderState::Idle
        );
        assert_eq!(ctrl.state().await, RecorderState::Recording);
    }

    #[tokio::test]
    async fn concurrent_starts_open_one_session() {
        let mut capture = ScriptedCapture::new(vec![Script::new(&["A"], ""), Script::new(&["B"], "")]);
        capture.start_delay = StdDuration::from_millis(50);
        let stops = capture.stops.clone();
        let ctrl = controller(
            capture,
            RecordingUploader::answering(200),
            CountingPlayback::default(),
        );

        let (first, second) = tokio::join!(ctrl.start(), ctrl.start());

        assert!(first.is_ok() != second.is_ok());
        assert_eq!(stops.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn playback_can_be_disabled() {
        let playback = CountingPlayback::default();
        let ctrl = RecorderController::new(
            ScriptedCapture::new(vec![Script::new(&["A"], "")]),
            RecordingUploader::answering(200),
            playback.clone(),
            ControllerConfig {
                content_type: AudioMimeType::Wav,
                playback: false,
            },
        );

        ctrl.start().await.unwrap();
        let finished = ctrl.stop().await.unwrap();

        assert_eq!(finished.audio.mime_type(), AudioMimeType::Wav);
        assert!(finished.playback.is_none());
        assert_eq!(playback.plays(), 0);
    }
}
