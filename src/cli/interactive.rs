//! Interactive record/stop loop driven by stdin

use std::io::{self, BufRead};
use std::process::ExitCode;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::application::ports::{AudioCapture, Playback, Uploader};
use crate::application::{CancelToken, ControllerError, PlaybackTask, RecorderController, UploadTask};
use crate::domain::recording::{Duration, RecorderState};

use super::app::{build_controller, RunOptions, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// A line typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveCommand {
    /// Bare Enter: start when idle, stop when recording
    Toggle,
    Record,
    Stop,
    Quit,
    Help,
}

impl InteractiveCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" => Some(Self::Toggle),
            "r" | "record" => Some(Self::Record),
            "s" | "stop" => Some(Self::Stop),
            "q" | "quit" | "exit" => Some(Self::Quit),
            "h" | "help" | "?" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Outcome of an interactive run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InteractiveSummary {
    /// Recordings stopped and handed to the uploader
    pub recordings: usize,
    pub failed_uploads: usize,
    /// Ended by Ctrl+C rather than quit or end of input
    pub interrupted: bool,
}

impl InteractiveSummary {
    pub fn exit_code(&self) -> u8 {
        if self.failed_uploads == 0 && !self.interrupted {
            EXIT_SUCCESS
        } else {
            EXIT_ERROR
        }
    }
}

/// An upload still being reported on
struct PendingUpload {
    cancel: CancelToken,
    report: JoinHandle<bool>,
}

/// Uploads and playbacks started by the loop
#[derive(Default)]
struct Background {
    uploads: Vec<PendingUpload>,
    playbacks: Vec<PlaybackTask>,
}

/// Run the interactive loop until quit, end of input or Ctrl+C
pub async fn run_interactive(options: RunOptions) -> ExitCode {
    let presenter = Presenter::new();

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

    presenter.info(&format!(
        "Uploading to {}{} as {}",
        options.server_url.trim_end_matches('/'),
        options.upload_path,
        options.content_type
    ));
    presenter.controls();

    let summary = command_loop(
        &controller,
        spawn_line_reader(),
        &shutdown.token(),
        options.max_duration,
        &presenter,
    )
    .await;

    tracing::debug!(
        recordings = summary.recordings,
        failed_uploads = summary.failed_uploads,
        interrupted = summary.interrupted,
        "Interactive run finished"
    );
    ExitCode::from(summary.exit_code())
}

/// Apply typed lines to the controller until quit, a closed input or
/// `shutdown`. A recording running for `max_duration` is stopped and
/// uploaded as if the user had stopped it.
pub async fn command_loop<C, U, P>(
    controller: &RecorderController<C, U, P>,
    mut lines: mpsc::Receiver<String>,
    shutdown: &CancelToken,
    max_duration: Duration,
    presenter: &Presenter,
) -> InteractiveSummary
where
    C: AudioCapture,
    U: Uploader + 'static,
    P: Playback + 'static,
{
    let mut summary = InteractiveSummary::default();
    let mut background = Background::default();
    let mut deadline: Option<Instant> = None;

    summary.interrupted = loop {
        summary.failed_uploads += reap_finished(&mut background.uploads).await;
        background.playbacks.retain(|p| !p.is_finished());

        let command = tokio::select! {
            _ = shutdown.cancelled() => break true,
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                presenter.warn(&format!("Max duration {} reached, auto-stopping", max_duration));
                InteractiveCommand::Stop
            }
            line = lines.recv() => match line {
                Some(line) => match InteractiveCommand::parse(&line) {
                    Some(cmd) => cmd,
                    None => {
                        presenter.warn(&format!("Unknown command: {}", line.trim()));
                        continue;
                    }
                },
                None => InteractiveCommand::Quit,
            },
        };

        let state = controller.state().await;
        match (command, state) {
            (InteractiveCommand::Help, _) => presenter.controls(),
            (InteractiveCommand::Toggle | InteractiveCommand::Record, RecorderState::Idle) => {
                if start(controller, presenter).await {
                    deadline = Some(Instant::now() + max_duration.as_std());
                }
            }
            (InteractiveCommand::Toggle | InteractiveCommand::Stop, RecorderState::Recording) => {
                deadline = None;
                if stop(controller, presenter, &mut background).await {
                    summary.recordings += 1;
                }
            }
            (InteractiveCommand::Record, RecorderState::Recording) => {
                presenter.warn("Already recording");
            }
            (InteractiveCommand::Stop, RecorderState::Idle) => {
                presenter.warn("Not recording");
            }
            (InteractiveCommand::Quit, state) => {
                if state == RecorderState::Recording
                    && stop(controller, presenter, &mut background).await
                {
                    summary.recordings += 1;
                }
                break false;
            }
        }
    };

    let Background { uploads, playbacks } = background;

    if summary.interrupted {
        presenter.warn("Interrupted, discarding recording and pending uploads");
        if controller.state().await == RecorderState::Recording {
            if let Err(e) = controller.cancel().await {
                tracing::debug!(error = %e, "Nothing to cancel");
            }
        }
        for upload in &uploads {
            upload.cancel.cancel();
        }
    } else if !uploads.is_empty() {
        presenter.info(&format!("Waiting for {} upload(s)...", uploads.len()));
    }

    summary.failed_uploads += wait_all(uploads, shutdown).await;
    if !summary.interrupted {
        wait_playbacks(playbacks, shutdown).await;
    }

    summary
}

/// Read stdin lines on a plain thread. A read still blocked at exit must
/// not hold up runtime shutdown, which a tokio blocking task would.
fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    let spawned = std::thread::Builder::new()
        .name("voxpost-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "Failed to spawn stdin reader");
    }
    rx
}

async fn start<C, U, P>(controller: &RecorderController<C, U, P>, presenter: &Presenter) -> bool
where
    C: AudioCapture,
    U: Uploader + 'static,
    P: Playback + 'static,
{
    match controller.start().await {
        Ok(id) => {
            tracing::debug!(session = %id, "Interactive session started");
            presenter.info("Recording... (Enter or 's' to stop)");
            true
        }
        Err(ControllerError::InvalidState(e)) => {
            presenter.warn(&e.to_string());
            false
        }
        Err(e) => {
            presenter.error(&e.to_string());
            false
        }
    }
}

/// Stop the active recording and track its upload and playback
async fn stop<C, U, P>(
    controller: &RecorderController<C, U, P>,
    presenter: &Presenter,
    background: &mut Background,
) -> bool
where
    C: AudioCapture,
    U: Uploader + 'static,
    P: Playback + 'static,
{
    let elapsed = controller.elapsed().await.unwrap_or_default();
    match controller.stop().await {
        Ok(finished) => {
            presenter.success(&format!(
                "Recorded {} ({})",
                presenter.format_elapsed(elapsed),
                finished.audio.human_readable_size()
            ));
            background.uploads.push(report_upload(finished.upload));
            background.playbacks.extend(finished.playback);
            true
        }
        Err(e) => {
            presenter.error(&e.to_string());
            false
        }
    }
}

/// Report an upload's outcome once it settles
fn report_upload(upload: UploadTask) -> PendingUpload {
    let cancel = upload.cancel_token();

    let report = tokio::spawn(async move {
        let presenter = Presenter::new();
        match upload.wait().await {
            Ok(receipt) => {
                presenter.success(&format!(
                    "Audio uploaded successfully ({} bytes)",
                    receipt.bytes_sent
                ));
                true
            }
            Err(e) => {
                presenter.error(&format!("Upload failed: {}", e));
                false
            }
        }
    });

    PendingUpload { cancel, report }
}

/// Drop settled uploads, returning how many failed
async fn reap_finished(pending: &mut Vec<PendingUpload>) -> usize {
    let (done, running): (Vec<_>, Vec<_>) = pending
        .drain(..)
        .partition(|upload| upload.report.is_finished());
    *pending = running;

    let mut failures = 0;
    for upload in done {
        if !matches!(upload.report.await, Ok(true)) {
            failures += 1;
        }
    }
    failures
}

/// Wait for every pending upload, returning how many failed. Ctrl+C cancels
/// whatever is still running.
async fn wait_all(pending: Vec<PendingUpload>, shutdown: &CancelToken) -> usize {
    let mut failures = 0;
    for upload in pending {
        let cancel = upload.cancel.clone();
        let mut report = upload.report;
        let ok = tokio::select! {
            result = &mut report => matches!(result, Ok(true)),
            _ = shutdown.cancelled() => {
                cancel.cancel();
                matches!(report.await, Ok(true))
            }
        };
        if !ok {
            failures += 1;
        }
    }
    failures
}

/// Let local playback finish before exiting; Ctrl+C skips the rest
async fn wait_playbacks(playbacks: Vec<PlaybackTask>, shutdown: &CancelToken) {
    for playback in playbacks {
        tokio::select! {
            _ = playback.wait() => {}
            _ = shutdown.cancelled() => return,
        }
    }
}
