//! CLI - Command Line Interface for raidclip
//!
//! `run` starts the chat bot. `clip` performs a single selection and prints
//! it, which is handy for checking a channel or the config without going live.
//!
//! # Examples
//!
//! ```bash
//! # Run the bot for the configured channel
//! raidclip
//!
//! # Preview what "?so some_streamer" would show
//! raidclip clip some_streamer --rule most-popular --json
//!
//! # Where is my config?
//! raidclip config --path
//!
//! # Create one to edit
//! raidclip config --init
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::models::ChoiceRule;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or API error
    NetworkError = 3,
    /// No clip met the view floor
    NoClip = 4,
    /// Config file or credentials problem
    ConfigError = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// raidclip - play a clip of whoever just raided you
///
/// Run without arguments to start the bot.
#[derive(Parser, Debug)]
#[command(
    name = "raidclip",
    version,
    about = "Raid shoutout bot that plays a recent clip of the raiding channel",
    long_about = "Watches your chat. When you type the shoutout command, picks a \
                  recent clip from the last raider (or the channel you name) and \
                  plays it on the overlay.\n\n\
                  Run without arguments to start the bot.",
    after_help = "EXAMPLES:\n\
                  raidclip                              Start the bot\n\
                  raidclip run --channel my_channel     Start for another channel\n\
                  raidclip clip some_streamer --json    Preview a selection"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to run (omit to start the bot)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Subcommand, defaulting to `run`
    pub fn command_or_run(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run(RunCmd::default()))
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Connect to chat and run the bot
    #[command(visible_alias = "r")]
    Run(RunCmd),

    /// Pick one clip for a channel and print it
    #[command(visible_alias = "c")]
    Clip(ClipCmd),

    /// Show the effective configuration
    Config(ConfigCmd),
}

/// Run the bot
#[derive(Args, Debug, Clone, Default)]
pub struct RunCmd {
    /// Channel to monitor (overrides config)
    #[arg(long)]
    pub channel: Option<String>,
}

/// One-shot clip selection
#[derive(Args, Debug, Clone)]
pub struct ClipCmd {
    /// Channel login to pick a clip from
    #[arg(required = true)]
    pub login: String,

    /// Window width in days (overrides config)
    #[arg(long, short = 'd')]
    pub days: Option<u32>,

    /// Selection rule (overrides config)
    #[arg(long, short = 'r', value_enum)]
    pub rule: Option<RuleArg>,

    /// Minimum view count (overrides config)
    #[arg(long, short = 'm')]
    pub min_views: Option<u64>,
}

/// Selection rule on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleArg {
    /// Uniform pick among qualifying clips
    Random,
    /// Most viewed qualifying clip
    MostPopular,
}

impl From<RuleArg> for ChoiceRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Random => ChoiceRule::Random,
            RuleArg::MostPopular => ChoiceRule::MostPopular,
        }
    }
}

/// Configuration inspection
#[derive(Args, Debug, Clone)]
pub struct ConfigCmd {
    /// Only print the config file path
    #[arg(long)]
    pub path: bool,

    /// Write a config file with default settings if none exists
    #[arg(long, conflicts_with = "path")]
    pub init: bool,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}
