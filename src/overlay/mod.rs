//! On-screen shoutout overlay
//!
//! - `Overlay`: the Idle → Displaying → Closing → Idle state machine
//! - `surface`: what the machine drives (fields, reveal, playback, hide)
//! - `player`: mpv/VLC process used by the production surface
//!
//! Only one session is visible at a time. A `show` that arrives while a
//! session is running waits in a single pending slot; a newer request
//! replaces an older pending one.

pub mod player;
pub mod surface;

use chrono::{DateTime, Datelike, Local, TimeZone};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::models::Shoutout;

pub use player::{LocalPlayer, PlayerError, PlayerType};
pub use surface::{OverlaySurface, PlayerSurface};

/// Identifies one display cycle; signals for any other session are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Signals reported back by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The video reached its natural end
    PlaybackEnded(SessionId),
    /// The hide transition finished
    TransitionEnded(SessionId),
}

/// Text and URLs rendered for one shoutout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayFields {
    pub icon_url: String,
    pub display_name: String,
    /// `@login`
    pub user_login: String,
    /// `YYYY/M/D`, see [`format_clip_date`]
    pub date: String,
    /// Title wrapped in 「」
    pub title: String,
    pub video_url: String,
}

impl OverlayFields {
    /// Fields with the clip date shown in local time
    pub fn new(shoutout: &Shoutout) -> Self {
        Self::with_timezone(shoutout, &Local)
    }

    pub fn with_timezone<Tz: TimeZone>(shoutout: &Shoutout, tz: &Tz) -> Self {
        let Shoutout { user, clip } = shoutout;
        Self {
            icon_url: user.profile_image_url.clone(),
            display_name: user.display_name.clone(),
            user_login: format!("@{}", user.login),
            date: format_clip_date(&clip.created_at.with_timezone(tz)),
            title: format!("「{}」", clip.title),
            video_url: clip.video_url(),
        }
    }
}

/// `YEAR/MONTH/DAY` where MONTH is the zero-based month index.
///
/// The zero-based month matches what the overlay has always shown (March is
/// `2`). Whether that is intended is an open product question, so it is
/// kept as-is here rather than silently shifted.
pub fn format_clip_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!("{}/{}/{}", date.year(), date.month0(), date.day())
}

/// A shoutout currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySession {
    pub id: SessionId,
    pub shoutout: Shoutout,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayState {
    /// Nothing rendered, overlay hidden
    #[default]
    Idle,
    /// Fields shown, video playing
    Displaying(OverlaySession),
    /// Hide transition running
    Closing(OverlaySession),
}

impl OverlayState {
    pub fn is_idle(&self) -> bool {
        matches!(self, OverlayState::Idle)
    }

    pub fn session(&self) -> Option<&OverlaySession> {
        match self {
            OverlayState::Idle => None,
            OverlayState::Displaying(s) | OverlayState::Closing(s) => Some(s),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            OverlayState::Idle => "idle",
            OverlayState::Displaying(_) => "displaying",
            OverlayState::Closing(_) => "closing",
        }
    }
}

/// Result of [`Overlay::show`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Rendered immediately
    Started(SessionId),
    /// Waiting for the current session to finish
    Queued,
    /// Waiting, and an older pending request was dropped
    Replaced,
}

/// Overlay state machine driving an [`OverlaySurface`]
pub struct Overlay<S: OverlaySurface> {
    surface: S,
    volume: f32,
    state: OverlayState,
    pending: Option<Shoutout>,
    next_session: u64,
}

impl<S: OverlaySurface> Overlay<S> {
    pub fn new(surface: S, volume: f32) -> Self {
        Self {
            surface,
            volume: volume.clamp(0.0, 1.0),
            state: OverlayState::Idle,
            pending: None,
            next_session: 0,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn pending(&self) -> Option<&Shoutout> {
        self.pending.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Show a shoutout now if idle, otherwise park it in the pending slot
    pub fn show(&mut self, shoutout: Shoutout) -> ShowOutcome {
        if self.state.is_idle() {
            return ShowOutcome::Started(self.start(shoutout));
        }

        let outcome = match self.pending.replace(shoutout) {
            Some(dropped) => {
                info!(dropped = %dropped.user.login, "pending shoutout replaced");
                ShowOutcome::Replaced
            }
            None => ShowOutcome::Queued,
        };
        debug!(state = self.state.name(), ?outcome, "overlay busy");
        outcome
    }

    /// Feed a surface signal into the machine
    pub fn handle(&mut self, event: OverlayEvent) {
        match event {
            OverlayEvent::PlaybackEnded(id) => self.playback_ended(id),
            OverlayEvent::TransitionEnded(id) => self.transition_ended(id),
        }
    }

    /// Displaying → Closing
    pub fn playback_ended(&mut self, id: SessionId) {
        match std::mem::take(&mut self.state) {
            OverlayState::Displaying(session) if session.id == id => {
                debug!(session = %id, "playback ended, hiding");
                self.surface.hide(id);
                self.state = OverlayState::Closing(session);
            }
            other => {
                debug!(session = %id, state = other.name(), "stale playback signal ignored");
                self.state = other;
            }
        }
    }

    /// Closing → Idle, then start whatever is pending
    pub fn transition_ended(&mut self, id: SessionId) {
        match std::mem::take(&mut self.state) {
            OverlayState::Closing(session) if session.id == id => {
                self.surface.clear();
                self.surface.detach_video();
                info!(session = %id, channel = %session.shoutout.user.login, "overlay closed");

                if let Some(next) = self.pending.take() {
                    self.start(next);
                }
            }
            other => {
                debug!(session = %id, state = other.name(), "stale transition signal ignored");
                self.state = other;
            }
        }
    }

    fn start(&mut self, shoutout: Shoutout) -> SessionId {
        self.next_session += 1;
        let id = SessionId(self.next_session);
        let fields = OverlayFields::new(&shoutout);

        info!(
            session = %id,
            channel = %shoutout.user.login,
            views = shoutout.clip.view_count,
            "showing clip"
        );

        self.surface.render(&fields);
        self.surface.reveal();
        self.surface
            .play(id, &fields.video_url, self.volume, shoutout.clip.duration);
        self.state = OverlayState::Displaying(OverlaySession { id, shoutout });
        id
    }
}
