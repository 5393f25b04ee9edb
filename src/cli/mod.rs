//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, logging setup, signal
//! handling, and the one-shot and interactive runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod interactive;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_oneshot, RunOptions, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use interactive::run_interactive;
pub use presenter::Presenter;
