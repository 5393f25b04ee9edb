//! CLI argument definitions using Clap

use clap::{ArgAction, Parser, Subcommand};

/// voxpost - record a voice memo, hear it back, upload it
#[derive(Parser, Debug)]
#[command(name = "voxpost")]
#[command(version)]
#[command(about = "Record microphone audio, play it back and upload it to an HTTP endpoint")]
#[command(long_about = None)]
pub struct Cli {
    /// Record once for a fixed time, then upload and exit (e.g., 10s, 1m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Server base URL
    #[arg(short = 's', long, value_name = "URL", env = "VOXPOST_SERVER_URL")]
    pub server: Option<String>,

    /// Upload path on the server
    #[arg(short = 'p', long, value_name = "PATH")]
    pub path: Option<String>,

    /// Content type the recording is declared as
    #[arg(long, value_name = "MIME")]
    pub content_type: Option<String>,

    /// Upload request timeout
    #[arg(long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// Auto-stop a recording after this long
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Skip local playback of each recording
    #[arg(long)]
    pub no_playback: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "server_url",
    "upload_path",
    "content_type",
    "timeout",
    "chunk_interval",
    "max_duration",
    "playback",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
