//! raidclip - raid shoutout bot
//!
//! When the broadcaster types the shoutout command in chat, picks a recent
//! clip from the last raider (or a named channel) and plays it on the overlay.
//!
//! # Usage
//!
//! ```bash
//! # Start the bot
//! TWITCH_CLIENT_ID=... TWITCH_CLIENT_SECRET=... raidclip run --channel my_channel
//!
//! # CLI mode (for checking a channel)
//! raidclip clip some_streamer --json
//! raidclip config --path
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use raidclip::cli::{Cli, Command, ExitCode, Output};
use raidclip::commands;
use raidclip::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Log to stderr so JSON on stdout stays parseable
fn init_tracing(verbose: bool) {
    let default = if verbose { "raidclip=debug" } else { "raidclip=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let loaded = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::ConfigError),
    };

    match cli.command_or_run() {
        Command::Run(cmd) => commands::run_cmd(cmd, &config, &output).await,
        Command::Clip(cmd) => commands::clip_cmd(cmd, &config, &output).await,
        Command::Config(cmd) => commands::config_cmd(cmd, &config, cli.config.as_deref(), &output),
    }
}
