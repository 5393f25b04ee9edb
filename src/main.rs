//! voxpost CLI entry point

use std::process::ExitCode;

use clap::Parser;

use voxpost::cli::{
    app::{
        load_merged_config, parse_duration, run_oneshot, RunOptions, EXIT_ERROR, EXIT_USAGE_ERROR,
    },
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    interactive::run_interactive,
    logging::init_logging,
    presenter::Presenter,
};
use voxpost::domain::config::AppConfig;
use voxpost::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();
    let store = XdgConfigStore::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        server_url: cli.server.clone().filter(|s| !s.trim().is_empty()),
        upload_path: cli.path.clone(),
        content_type: cli.content_type.clone(),
        timeout: cli.timeout.clone(),
        chunk_interval: None,
        max_duration: cli.max_duration.clone(),
        playback: if cli.no_playback { Some(false) } else { None },
    };

    let config = load_merged_config(&store, cli_config).await;

    let options = match RunOptions::from_config(&config) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match parse_duration("duration", cli.duration.as_deref()) {
        Ok(Some(duration)) => run_oneshot(options, duration).await,
        Ok(None) => run_interactive(options).await,
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_USAGE_ERROR)
        }
    }
}
