//! CLI Command Handlers
//!
//! Implements all CLI commands by wiring config, API clients and the bot.
//! Each handler takes its args, the loaded config and Output, returns ExitCode.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::{AuthClient, HelixClient, HelixError};
use crate::bot::Bot;
use crate::chat::TwitchChat;
use crate::cli::{ClipCmd, ConfigCmd, ExitCode, Output, RunCmd};
use crate::config::Config;
use crate::dispatch::CommandDispatcher;
use crate::models::{ChoiceRule, Clip, Shoutout, User};
use crate::overlay::{LocalPlayer, Overlay, OverlayFields, PlayerSurface};
use crate::selector::{ClipSelector, SelectError};

/// Authenticate once and build the Helix client
async fn helix_client(config: &Config, output: &Output) -> Result<HelixClient, ExitCode> {
    let credentials = config
        .credentials()
        .map_err(|e| output.error(e.to_string(), ExitCode::ConfigError))?;

    let http_error = |e: HelixError| output.error(format!("HTTP client setup failed: {}", e), ExitCode::Error);

    let token = AuthClient::new()
        .and_then(|auth| auth.with_timeout(config.request_timeout()))
        .map_err(http_error)?
        .app_token(&credentials.client_id, &credentials.client_secret)
        .await
        .map_err(|e| output.error(format!("Authentication failed: {}", e), ExitCode::NetworkError))?;

    info!(expires_in = token.expires_in, "app token acquired");
    HelixClient::new(credentials.client_id, token.access_token)
        .and_then(|helix| helix.with_timeout(config.request_timeout()))
        .map_err(http_error)
}

// =============================================================================
// Run Command
// =============================================================================

pub async fn run_cmd(cmd: RunCmd, config: &Config, output: &Output) -> ExitCode {
    let request = match config.selection_request() {
        Ok(request) => request,
        Err(e) => return output.error(e.to_string(), ExitCode::ConfigError),
    };
    let channel = match config.channel(cmd.channel.as_deref()) {
        Ok(channel) => channel,
        Err(e) => return output.error(e.to_string(), ExitCode::ConfigError),
    };
    let player = match config.player_type() {
        Ok(player) => player.map(LocalPlayer::new),
        Err(e) => return output.error(e.to_string(), ExitCode::ConfigError),
    };

    let helix = match helix_client(config, output).await {
        Ok(helix) => helix,
        Err(code) => return code,
    };

    let player = match player {
        Some(player) if !player.is_available().await => {
            warn!(player = %player.player_type(), "player not installed, running headless");
            None
        }
        other => other,
    };

    let selector = ClipSelector::new(Arc::new(helix));
    let dispatcher = CommandDispatcher::new(config.command.clone(), request, selector);

    let (overlay_tx, mut overlay_rx) = mpsc::unbounded_channel();
    let surface = PlayerSurface::new(player, config.fade(), overlay_tx);
    let overlay = Overlay::new(surface, config.volume);

    let mut chat = match TwitchChat::connect(&channel).await {
        Ok(chat) => chat,
        Err(e) => return output.error(format!("Chat connection failed: {}", e), ExitCode::NetworkError),
    };

    output.info(format!(
        "Listening for {} in #{} ({} days, {}, min {} views)",
        config.command, channel, request.window_days, request.rule, request.min_view_count
    ));

    let mut bot = Bot::new(dispatcher, overlay, config.command_timeout());
    tokio::select! {
        result = bot.run(&mut chat.events, &mut overlay_rx) => match result {
            Ok(()) => output.error("Chat connection closed", ExitCode::NetworkError),
            Err(e) => output.error(format!("Bot stopped: {}", e), ExitCode::Error),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            ExitCode::Success
        }
    }
}

// =============================================================================
// Clip Command
// =============================================================================

/// What `clip` prints
#[derive(Debug, Serialize)]
pub struct ClipReport {
    pub user: User,
    pub clip: Clip,
    pub overlay: OverlayFields,
}

pub async fn clip_cmd(cmd: ClipCmd, config: &Config, output: &Output) -> ExitCode {
    let overridden = Config {
        window_days: cmd.days.unwrap_or(config.window_days),
        choice_rule: cmd
            .rule
            .map(|r| ChoiceRule::from(r).to_string())
            .unwrap_or_else(|| config.choice_rule.clone()),
        min_view_count: cmd.min_views.unwrap_or(config.min_view_count),
        ..config.clone()
    };
    let request = match overridden.selection_request() {
        Ok(request) => request,
        Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
    };

    let helix = match helix_client(config, output).await {
        Ok(helix) => helix,
        Err(code) => return code,
    };
    let selector = ClipSelector::new(Arc::new(helix));
    let login = cmd.login.trim_start_matches('@');

    output.info(format!(
        "Searching clips for {} ({} day windows, {}, min {} views)",
        login, request.window_days, request.rule, request.min_view_count
    ));

    let user = match selector.resolve_user(login).await {
        Ok(user) => user,
        Err(SelectError::UserNotFound(_)) => {
            return output.error(format!("No such user: {}", login), ExitCode::InvalidArgs)
        }
        Err(e) => return output.error(format!("Lookup failed: {}", e), ExitCode::NetworkError),
    };

    let timeout = config.command_timeout();
    let chosen = match tokio::time::timeout(timeout, selector.choose_clip_for(&user, &request)).await {
        Ok(chosen) => chosen,
        Err(_) => {
            return output.error(
                format!("Clip search timed out after {}s", timeout.as_secs()),
                ExitCode::NetworkError,
            )
        }
    };

    match chosen {
        Ok(Some(clip)) => {
            let shoutout = Shoutout { user, clip };
            let report = ClipReport {
                overlay: OverlayFields::new(&shoutout),
                user: shoutout.user,
                clip: shoutout.clip,
            };
            if let Err(e) = output.print(&report) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Ok(None) => output.error(
            format!("No clip with at least {} views found", request.min_view_count),
            ExitCode::NoClip,
        ),
        Err(e) => output.error(format!("Clip search failed: {}", e), ExitCode::NetworkError),
    }
}

// =============================================================================
// Config Command
// =============================================================================

pub fn config_cmd(cmd: ConfigCmd, config: &Config, path: Option<&Path>, output: &Output) -> ExitCode {
    let path = path.map(|p| p.to_path_buf()).or_else(Config::path);

    if cmd.init {
        let Some(path) = path else {
            return output.error("Could not determine config path", ExitCode::ConfigError);
        };
        if path.exists() {
            return output.error(
                format!("Config already exists at {}", path.display()),
                ExitCode::ConfigError,
            );
        }
        if let Err(e) = config.save_to(&path) {
            return output.error(format!("{:#}", e), ExitCode::Error);
        }
        info!(path = %path.display(), "config written");
        println!("{}", path.display());
        return ExitCode::Success;
    }

    if cmd.path {
        return match path {
            Some(path) => {
                println!("{}", path.display());
                ExitCode::Success
            }
            None => output.error("Could not determine config path", ExitCode::ConfigError),
        };
    }

    let masked = Config {
        client_secret: config.client_secret.as_ref().map(|_| "********".to_string()),
        ..config.clone()
    };
    if let Err(e) = output.print(&masked) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    match masked.validate() {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(e.to_string(), ExitCode::ConfigError),
    }
}
