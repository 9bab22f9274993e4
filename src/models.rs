//! Data structures and types for raidclip
//!
//! Contains all shared models used across the bot organized by domain:
//! - **Selection**: choice rules, selection requests, time windows
//! - **Helix**: clips, users and paginated clip pages
//! - **Chat**: inbound chat messages and raid notices
//! - **Shoutout**: a resolved clip/user pair ready for the overlay

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static PREVIEW_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"-preview.*").ok());

// =============================================================================
// Selection Models
// =============================================================================

/// Rule applied to the candidate set of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChoiceRule {
    /// Uniform pick over all candidates
    #[default]
    Random,
    /// Highest view count, first seen wins ties
    MostPopular,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown choice rule: {0} (expected RANDOM or MOST_POPULAR)")]
pub struct UnknownChoiceRule(pub String);

impl FromStr for ChoiceRule {
    type Err = UnknownChoiceRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "RANDOM" => Ok(ChoiceRule::Random),
            "MOST_POPULAR" => Ok(ChoiceRule::MostPopular),
            _ => Err(UnknownChoiceRule(s.to_string())),
        }
    }
}

impl fmt::Display for ChoiceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceRule::Random => write!(f, "RANDOM"),
            ChoiceRule::MostPopular => write!(f, "MOST_POPULAR"),
        }
    }
}

/// Parameters for one clip selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Width of each search window in days (> 0)
    pub window_days: u32,
    pub rule: ChoiceRule,
    /// Clips below this view count are never returned
    pub min_view_count: u64,
}

impl SelectionRequest {
    pub fn new(window_days: u32, rule: ChoiceRule) -> Self {
        Self {
            window_days,
            rule,
            min_view_count: 0,
        }
    }

    pub fn with_min_view_count(mut self, min_view_count: u64) -> Self {
        self.min_view_count = min_view_count;
        self
    }

    /// Window for attempt `attempt`, counting backward from `now`.
    ///
    /// Attempt 0 is `[now - d, now]`, attempt 1 is `[now - 2d, now - d]`
    /// and so on, so consecutive windows share exactly one boundary.
    /// `None` once the window would start before the earliest representable date.
    pub fn window(&self, now: DateTime<Utc>, attempt: u32) -> Option<TimeWindow> {
        let width = Duration::try_days(i64::from(self.window_days))?;
        let offset = width.checked_mul(i32::try_from(attempt).ok()?)?;
        let ended_at = now.checked_sub_signed(offset)?;
        Some(TimeWindow {
            started_at: ended_at.checked_sub_signed(width)?,
            ended_at,
        })
    }
}

/// Half-open search range sent to the clips endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl TimeWindow {
    /// RFC 3339 with milliseconds and a `Z` suffix, e.g. `2024-05-01T12:00:00.000Z`
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn ended_at_rfc3339(&self) -> String {
        self.ended_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn width(&self) -> Duration {
        self.ended_at - self.started_at
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.started_at_rfc3339(),
            self.ended_at_rfc3339()
        )
    }
}

// =============================================================================
// Helix Models
// =============================================================================

/// Clip metadata as returned by the clips endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub view_count: u64,
    #[serde(default)]
    pub game_id: String,
    pub created_at: DateTime<Utc>,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl Clip {
    /// Direct video URL: the `-preview…` part of the thumbnail becomes `.mp4`
    pub fn video_url(&self) -> String {
        match PREVIEW_SUFFIX.as_ref() {
            Some(re) => re.replace(&self.thumbnail_url, ".mp4").into_owned(),
            None => self.thumbnail_url.clone(),
        }
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({} views)", self.title, self.view_count)
    }
}

/// Broadcaster account info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (@{})", self.display_name, self.login)
    }
}

/// One page of clips plus the continuation cursor, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipPage {
    pub clips: Vec<Clip>,
    pub cursor: Option<String>,
}

// =============================================================================
// Chat Models
// =============================================================================

/// A chat line as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel: String,
    pub sender: String,
    /// Badge names without versions (`broadcaster`, `moderator`, ...)
    pub badges: BTreeSet<String>,
    pub text: String,
}

impl ChatMessage {
    pub fn is_broadcaster(&self) -> bool {
        self.badges.contains("broadcaster")
    }
}

/// Incoming raid on the monitored channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidNotice {
    pub channel: String,
    pub display_name: String,
    pub viewer_count: u64,
    /// Raider's login name
    pub login: String,
}

/// Everything the chat transport can emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message(ChatMessage),
    Raid(RaidNotice),
}

// =============================================================================
// Shoutout
// =============================================================================

/// A clip chosen for a user, ready to be shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shoutout {
    pub user: User,
    pub clip: Clip,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clip(thumbnail_url: &str) -> Clip {
        Clip {
            id: "AwkwardHelplessSalamander".to_string(),
            url: String::new(),
            thumbnail_url: thumbnail_url.to_string(),
            title: "gg".to_string(),
            view_count: 10,
            game_id: "509658".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
            duration: Some(28.5),
        }
    }

    // -------------------------------------------------------------------------
    // ChoiceRule Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_choice_rule_from_str() {
        assert_eq!("RANDOM".parse::<ChoiceRule>(), Ok(ChoiceRule::Random));
        assert_eq!(
            "MOST_POPULAR".parse::<ChoiceRule>(),
            Ok(ChoiceRule::MostPopular)
        );
        assert_eq!(
            "most-popular".parse::<ChoiceRule>(),
            Ok(ChoiceRule::MostPopular)
        );
        assert!("LEAST_POPULAR".parse::<ChoiceRule>().is_err());
    }

    #[test]
    fn test_choice_rule_serde() {
        let json = serde_json::to_string(&ChoiceRule::MostPopular).unwrap();
        assert_eq!(json, "\"MOST_POPULAR\"");

        let parsed: Result<ChoiceRule, _> = serde_json::from_str("\"WHATEVER\"");
        assert!(parsed.is_err());
    }

    // -------------------------------------------------------------------------
    // Window Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_windows_are_contiguous() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let request = SelectionRequest::new(7, ChoiceRule::Random);

        let first = request.window(now, 0).unwrap();
        let second = request.window(now, 1).unwrap();

        assert_eq!(first.ended_at, now);
        assert_eq!(first.started_at, Utc.with_ymd_and_hms(2024, 5, 25, 0, 0, 0).unwrap());
        assert_eq!(second.ended_at, first.started_at);
        assert_eq!(second.width(), Duration::days(7));
    }

    #[test]
    fn test_window_past_earliest_date_is_none() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let request = SelectionRequest::new(u32::MAX, ChoiceRule::Random);
        assert_eq!(request.window(now, 0), None);
        assert_eq!(request.window(now, 9), None);

        // Large but representable
        let request = SelectionRequest::new(36_500, ChoiceRule::Random);
        assert!(request.window(now, 0).is_some());
    }

    #[test]
    fn test_window_rfc3339_format() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let window = SelectionRequest::new(1, ChoiceRule::Random).window(now, 0).unwrap();
        assert_eq!(window.ended_at_rfc3339(), "2024-06-01T08:30:00.000Z");
        assert_eq!(window.started_at_rfc3339(), "2024-05-31T08:30:00.000Z");
    }

    // -------------------------------------------------------------------------
    // Clip Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_video_url_replaces_preview_suffix() {
        let clip = clip("https://clips-media-assets2.twitch.tv/AT-cm%7C123-preview-480x272.jpg");
        assert_eq!(
            clip.video_url(),
            "https://clips-media-assets2.twitch.tv/AT-cm%7C123.mp4"
        );
    }

    #[test]
    fn test_video_url_without_preview_is_unchanged() {
        let clip = clip("https://example.com/thumb.jpg");
        assert_eq!(clip.video_url(), "https://example.com/thumb.jpg");
    }

    #[test]
    fn test_preview_pattern_compiles_once() {
        assert!(PREVIEW_SUFFIX.is_some());
        let clip = clip("https://x/a-preview-86x45.jpg");
        // Reused across calls
        assert_eq!(clip.video_url(), clip.video_url());
        assert_eq!(clip.video_url(), "https://x/a.mp4");
    }

    #[test]
    fn test_clip_deserialize_helix_shape() {
        let json = r#"{
            "id": "Abc",
            "url": "https://clips.twitch.tv/Abc",
            "broadcaster_id": "1234",
            "thumbnail_url": "https://x/1-preview-480x272.jpg",
            "title": "nice",
            "view_count": 42,
            "game_id": "33214",
            "created_at": "2024-03-09T12:00:00Z",
            "duration": 30.0
        }"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.view_count, 42);
        assert_eq!(clip.duration, Some(30.0));
    }

    #[test]
    fn test_chat_message_broadcaster_badge() {
        let mut msg = ChatMessage {
            channel: "#me".to_string(),
            sender: "me".to_string(),
            badges: BTreeSet::new(),
            text: "?so".to_string(),
        };
        assert!(!msg.is_broadcaster());
        msg.badges.insert("broadcaster".to_string());
        assert!(msg.is_broadcaster());
    }
}
