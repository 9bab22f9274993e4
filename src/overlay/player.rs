//! Local Player - VLC/mpv playback for clip videos
//!
//! The player window is the overlay's video element: it is started at a
//! fixed volume and its process exit is the "playback ended" signal.

use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerType {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle - check for it
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    /// Get a display name for this player
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Arguments that play `url` once at `volume` (0.0–1.0) and exit
    pub fn args(&self, url: &str, volume: f32, title: &str) -> Vec<String> {
        let volume = volume.clamp(0.0, 1.0);
        match self {
            PlayerType::Mpv => vec![
                url.to_string(),
                format!("--volume={}", (volume * 100.0).round() as u32),
                format!("--force-media-title={}", title),
                "--force-window=immediate".to_string(),
                "--no-terminal".to_string(),
            ],
            PlayerType::Vlc => vec![
                url.to_string(),
                format!("--gain={:.2}", volume),
                format!("--meta-title={}", title),
                "--play-and-exit".to_string(),
                "--no-video-title-show".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
}

/// Local player for clip videos
#[derive(Debug, Clone, Copy)]
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    /// Create a new local player with the specified type
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    /// Get the player type
    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        // If it's a full path (macOS app bundle), check if it exists
        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start playing `video_url`.
    ///
    /// The child is killed when dropped, so dropping it detaches the video.
    pub fn play(&self, video_url: &str, volume: f32, title: &str) -> Result<Child, PlayerError> {
        let mut cmd = Command::new(self.player_type.command());
        cmd.args(self.player_type.args(video_url, volume, title))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })
    }
}
