//! Shared fixtures for integration tests
//!
//! - `FakeGateway`: in-memory Helix with windowed, paginated clips
//! - `RecordingSurface`: overlay surface that records every call

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use raidclip::api::{ClipGateway, HelixError};
use raidclip::models::{Clip, ClipPage, TimeWindow, User};
use raidclip::overlay::{OverlayFields, OverlaySurface, SessionId};

// =============================================================================
// Fixtures
// =============================================================================

pub fn user(login: &str) -> User {
    User {
        id: format!("id-{}", login),
        login: login.to_string(),
        display_name: login.to_uppercase(),
        profile_image_url: format!("https://static-cdn.jtvnw.net/{}-profile.png", login),
    }
}

pub fn clip(id: &str, view_count: u64, created_at: DateTime<Utc>) -> Clip {
    Clip {
        id: id.to_string(),
        url: format!("https://clips.twitch.tv/{}", id),
        thumbnail_url: format!("https://clips-media-assets2.twitch.tv/{}-preview-480x272.jpg", id),
        title: format!("clip {}", id),
        view_count,
        game_id: "509658".to_string(),
        created_at,
        duration: Some(25.0),
    }
}

// =============================================================================
// Fake Gateway
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    User(String),
    Clips {
        broadcaster_id: String,
        window: TimeWindow,
        cursor: Option<String>,
    },
}

/// In-memory Helix. Cursors are page offsets rendered as strings.
pub struct FakeGateway {
    users: HashMap<String, User>,
    clips: HashMap<String, Vec<Clip>>,
    page_size: usize,
    failing_clips: bool,
    calls: Mutex<Vec<GatewayCall>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            clips: HashMap::new(),
            page_size: 2,
            failing_clips: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, login: &str) -> Self {
        self.users.insert(login.to_string(), user(login));
        self
    }

    pub fn with_clip(mut self, login: &str, clip: Clip) -> Self {
        self.clips
            .entry(format!("id-{}", login))
            .or_default()
            .push(clip);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn failing_clips(mut self) -> Self {
        self.failing_clips = true;
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Windows in the order they were first queried
    pub fn windows(&self) -> Vec<TimeWindow> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Clips {
                    window,
                    cursor: None,
                    ..
                } => Some(window),
                _ => None,
            })
            .collect()
    }

    pub fn user_lookups(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::User(login) => Some(login),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ClipGateway for FakeGateway {
    async fn get_user(&self, login: &str) -> Result<Option<User>, HelixError> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::User(login.to_string()));
        Ok(self.users.get(login).cloned())
    }

    async fn get_clips(
        &self,
        broadcaster_id: &str,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> Result<ClipPage, HelixError> {
        self.calls.lock().unwrap().push(GatewayCall::Clips {
            broadcaster_id: broadcaster_id.to_string(),
            window: *window,
            cursor: cursor.map(str::to_string),
        });

        if self.failing_clips {
            return Err(HelixError::ServerError(503));
        }

        let in_window: Vec<Clip> = self
            .clips
            .get(broadcaster_id)
            .map(|clips| {
                clips
                    .iter()
                    .filter(|c| c.created_at >= window.started_at && c.created_at < window.ended_at)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let offset: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (offset + self.page_size).min(in_window.len());
        let clips = in_window.get(offset..end).map(<[Clip]>::to_vec).unwrap_or_default();
        let cursor = (end < in_window.len()).then(|| end.to_string());

        Ok(ClipPage { clips, cursor })
    }
}

// =============================================================================
// Recording Surface
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Render(OverlayFields),
    Reveal,
    Play { session: SessionId, video_url: String, volume: f32 },
    Hide(SessionId),
    Clear,
    Detach,
}

/// Surface that only records; signals are sent by the test itself
#[derive(Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last rendered fields, if any are on screen
    pub fn visible_fields(&self) -> Option<OverlayFields> {
        let mut visible = None;
        for call in self.calls() {
            match call {
                SurfaceCall::Render(fields) => visible = Some(fields),
                SurfaceCall::Clear => visible = None,
                _ => {}
            }
        }
        visible
    }

    /// Video source currently attached, if any
    pub fn attached_video(&self) -> Option<String> {
        let mut attached = None;
        for call in self.calls() {
            match call {
                SurfaceCall::Play { video_url, .. } => attached = Some(video_url),
                SurfaceCall::Detach => attached = None,
                _ => {}
            }
        }
        attached
    }

    pub fn sessions_played(&self) -> Vec<SessionId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Play { session, .. } => Some(session),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OverlaySurface for RecordingSurface {
    fn render(&mut self, fields: &OverlayFields) {
        self.push(SurfaceCall::Render(fields.clone()));
    }

    fn reveal(&mut self) {
        self.push(SurfaceCall::Reveal);
    }

    fn play(&mut self, session: SessionId, video_url: &str, volume: f32, _duration: Option<f64>) {
        self.push(SurfaceCall::Play {
            session,
            video_url: video_url.to_string(),
            volume,
        });
    }

    fn hide(&mut self, session: SessionId) {
        self.push(SurfaceCall::Hide(session));
    }

    fn clear(&mut self) {
        self.push(SurfaceCall::Clear);
    }

    fn detach_video(&mut self) {
        self.push(SurfaceCall::Detach);
    }
}
