//! App runner: config resolution, adapter wiring and one-shot mode

use std::process::ExitCode;
use std::time::Duration as StdDuration;

use crate::application::ports::{ConfigStore, Playback, UploadError, Uploader};
use crate::application::{ControllerConfig, FinishedRecording, RecorderController, UploadTask};
use crate::domain::audio::AudioMimeType;
use crate::domain::config::AppConfig;
use crate::domain::recording::Duration;
use crate::infrastructure::{create_playback, CpalCapture, HttpUploader};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How often the one-shot progress bar refreshes
const PROGRESS_TICK: StdDuration = StdDuration::from_millis(100);

/// Controller wired to the real adapters
pub type AppController = RecorderController<CpalCapture, HttpUploader, Box<dyn Playback>>;

/// Fully resolved and validated run settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub server_url: String,
    pub upload_path: String,
    pub content_type: AudioMimeType,
    pub timeout: Duration,
    pub chunk_interval: Duration,
    pub max_duration: Duration,
    pub playback: bool,
}

impl RunOptions {
    /// Validate a merged config. Unlike the `*_or_default` accessors, a
    /// present but malformed value is an error here.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        Ok(Self {
            server_url: config.server_url_or_default().to_string(),
            upload_path: config.upload_path_or_default().to_string(),
            content_type: match config.content_type.as_deref() {
                Some(s) => s.parse().map_err(|e| format!("{}", e))?,
                None => AudioMimeType::default(),
            },
            timeout: parse_duration("timeout", config.timeout.as_deref())?
                .unwrap_or_else(Duration::default_upload_timeout),
            chunk_interval: parse_duration("chunk-interval", config.chunk_interval.as_deref())?
                .unwrap_or_else(Duration::default_chunk_interval),
            max_duration: parse_duration("max-duration", config.max_duration.as_deref())?
                .unwrap_or_else(Duration::default_max_duration),
            playback: config.playback_or_default(),
        })
    }
}

/// Parse an optional duration, naming the setting on failure
pub fn parse_duration(name: &str, value: Option<&str>) -> Result<Option<Duration>, String> {
    value
        .map(|s| {
            s.parse::<Duration>()
                .map_err(|e| format!("Invalid {}: {}", name, e))
        })
        .transpose()
}

/// Load and merge configuration from file and CLI. `VOXPOST_SERVER_URL`
/// reaches `cli_config` through clap, so it outranks the file but not `--server`.
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Wire the controller to cpal, reqwest and rodio
pub fn build_controller(options: &RunOptions) -> Result<AppController, UploadError> {
    let uploader = HttpUploader::new(&options.server_url, &options.upload_path, options.timeout)?;
    let capture = CpalCapture::new(options.chunk_interval);
    let playback = create_playback(options.playback);

    tracing::debug!(
        endpoint = %uploader.endpoint(),
        content_type = %options.content_type,
        chunk_interval = %options.chunk_interval,
        playback = options.playback,
        "Controller configured"
    );

    Ok(RecorderController::new(
        capture,
        uploader,
        playback,
        ControllerConfig {
            content_type: options.content_type,
            playback: options.playback,
        },
    ))
}

/// Record for a fixed duration, play back, upload and wait for the outcome
pub async fn run_oneshot(options: RunOptions, duration: Duration) -> ExitCode {
    let mut presenter = Presenter::new();

    let controller = match build_controller(&options) {
        Ok(c) => c,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = controller.start().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let length = if duration > options.max_duration {
        presenter.warn(&format!(
            "Duration {} exceeds max duration, recording for {}",
            duration, options.max_duration
        ));
        options.max_duration
    } else {
        duration
    };

    presenter.start_spinner("Recording...");
    let total_ms = length.as_millis();
    let interrupted = loop {
        let elapsed_ms = controller
            .elapsed()
            .await
            .map(|e| e.as_millis() as u64)
            .unwrap_or(total_ms);
        presenter.update_recording_progress(elapsed_ms.min(total_ms), total_ms);
        if elapsed_ms >= total_ms {
            break false;
        }

        let wait = PROGRESS_TICK.min(StdDuration::from_millis(total_ms - elapsed_ms));
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.wait() => break true,
        }
    };

    if interrupted {
        presenter.spinner_fail("Recording cancelled");
        if let Err(e) = controller.cancel().await {
            tracing::debug!(error = %e, "Nothing to cancel");
        }
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.update_spinner("Finishing recording...");
    let finished = match controller.stop().await {
        Ok(finished) => finished,
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    presenter.spinner_success(&format!(
        "Recorded {}",
        finished.audio.human_readable_size()
    ));

    let FinishedRecording {
        upload, playback, ..
    } = finished;
    let uploaded = wait_for_upload(upload, &mut presenter, &shutdown).await;

    if let Some(playback) = playback {
        tokio::select! {
            _ = playback.wait() => {}
            _ = shutdown.wait() => tracing::debug!("Playback cut short"),
        }
    }

    if uploaded {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Show a spinner until the upload settles; Ctrl+C cancels it.
/// Returns whether the server accepted the recording.
async fn wait_for_upload(
    upload: UploadTask,
    presenter: &mut Presenter,
    shutdown: &ShutdownSignal,
) -> bool {
    let token = upload.cancel_token();

    presenter.start_spinner("Uploading...");
    let outcome = tokio::select! {
        outcome = upload.wait() => outcome,
        _ = shutdown.wait() => {
            token.cancel();
            Err(UploadError::Cancelled)
        }
    };

    match outcome {
        Ok(receipt) => {
            presenter.spinner_success(&format!(
                "Audio uploaded successfully ({} bytes, HTTP {})",
                receipt.bytes_sent, receipt.status
            ));
            true
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            false
        }
    }
}
