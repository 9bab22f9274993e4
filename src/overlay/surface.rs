//! Overlay surfaces
//!
//! The state machine only talks to [`OverlaySurface`]. Surfaces report the
//! end of playback and of the hide transition asynchronously through an
//! [`OverlayEvent`] channel, tagged with the session they belong to.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::player::LocalPlayer;
use super::{OverlayEvent, OverlayFields, SessionId};

/// Used when neither a player nor the clip duration tells us when playback ends
const FALLBACK_CLIP_LENGTH: Duration = Duration::from_secs(30);

/// What the overlay state machine drives
pub trait OverlaySurface {
    /// Fill icon, names, date, title
    fn render(&mut self, fields: &OverlayFields);
    /// Make the container visible
    fn reveal(&mut self);
    /// Start the video; must eventually report `PlaybackEnded(session)`
    fn play(&mut self, session: SessionId, video_url: &str, volume: f32, duration: Option<f64>);
    /// Start the hide transition; must eventually report `TransitionEnded(session)`
    fn hide(&mut self, session: SessionId);
    /// Empty every rendered field
    fn clear(&mut self);
    /// Stop and drop the current video source
    fn detach_video(&mut self);
}

/// Surface backed by a local player window, or by timers when headless
pub struct PlayerSurface {
    player: Option<LocalPlayer>,
    fade: Duration,
    events: mpsc::UnboundedSender<OverlayEvent>,
    fields: Option<OverlayFields>,
    visible: bool,
    playback: Option<JoinHandle<()>>,
    transition: Option<JoinHandle<()>>,
}

impl PlayerSurface {
    /// `player = None` runs headless: playback lasts as long as the clip
    pub fn new(
        player: Option<LocalPlayer>,
        fade: Duration,
        events: mpsc::UnboundedSender<OverlayEvent>,
    ) -> Self {
        Self {
            player,
            fade,
            events,
            fields: None,
            visible: false,
            playback: None,
            transition: None,
        }
    }

    pub fn fields(&self) -> Option<&OverlayFields> {
        self.fields.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn play_for(&self, session: SessionId, length: Duration) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(length).await;
            let _ = events.send(OverlayEvent::PlaybackEnded(session));
        })
    }
}

impl OverlaySurface for PlayerSurface {
    fn render(&mut self, fields: &OverlayFields) {
        info!(
            display_name = %fields.display_name,
            user = %fields.user_login,
            date = %fields.date,
            title = %fields.title,
            "overlay rendered"
        );
        self.fields = Some(fields.clone());
    }

    fn reveal(&mut self) {
        self.visible = true;
    }

    fn play(&mut self, session: SessionId, video_url: &str, volume: f32, duration: Option<f64>) {
        self.detach_video();

        let length = duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(FALLBACK_CLIP_LENGTH);

        let Some(player) = self.player else {
            debug!(session = %session, url = video_url, ?length, "headless playback");
            self.playback = Some(self.play_for(session, length));
            return;
        };

        let title = self
            .fields
            .as_ref()
            .map(|f| f.title.as_str())
            .unwrap_or_default();

        self.playback = Some(match player.play(video_url, volume, title) {
            Ok(mut child) => {
                debug!(session = %session, player = %player.player_type(), url = video_url, "player started");
                let events = self.events.clone();
                tokio::spawn(async move {
                    let status = child.wait().await;
                    debug!(session = %session, ?status, "player exited");
                    let _ = events.send(OverlayEvent::PlaybackEnded(session));
                })
            }
            Err(e) => {
                error!(error = %e, "player failed to start, timing playback instead");
                self.play_for(session, length)
            }
        });
    }

    fn hide(&mut self, session: SessionId) {
        self.visible = false;
        if let Some(handle) = self.transition.take() {
            handle.abort();
        }

        let events = self.events.clone();
        let fade = self.fade;
        self.transition = Some(tokio::spawn(async move {
            tokio::time::sleep(fade).await;
            let _ = events.send(OverlayEvent::TransitionEnded(session));
        }));
    }

    fn clear(&mut self) {
        self.fields = None;
    }

    fn detach_video(&mut self) {
        // Aborting drops the child, which kills the player
        if let Some(handle) = self.playback.take() {
            handle.abort();
        }
    }
}

impl Drop for PlayerSurface {
    fn drop(&mut self) {
        self.detach_video();
        if let Some(handle) = self.transition.take() {
            handle.abort();
        }
    }
}
