//! Chat command handling
//!
//! Turns a broadcaster's `?so [login]` into a [`ShoutoutJob`]. The target
//! login is captured synchronously, so a raid that lands while the job is
//! in flight cannot change who the job is for.

use tracing::{debug, info, warn};

use crate::models::{ChatMessage, SelectionRequest, Shoutout};
use crate::raid::RaidTracker;
use crate::selector::{ClipSelector, SelectError};

/// Parses commands and builds jobs with the configured selection parameters
#[derive(Clone)]
pub struct CommandDispatcher {
    command: String,
    request: SelectionRequest,
    selector: ClipSelector,
}

impl CommandDispatcher {
    pub fn new(command: impl Into<String>, request: SelectionRequest, selector: ClipSelector) -> Self {
        Self {
            command: command.into(),
            request,
            selector,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Decide whether a chat line triggers a shoutout and for whom.
    ///
    /// Returns `None` for non-broadcasters, other messages, and when there is
    /// neither an argument nor a previous raider.
    pub fn on_chat_message(&self, message: &ChatMessage, raids: &RaidTracker) -> Option<ShoutoutJob> {
        if !message.is_broadcaster() {
            return None;
        }

        let login = parse_command(&message.text, &self.command)?
            .map(str::to_string)
            .unwrap_or_else(|| raids.current_raider().to_string());

        if login.is_empty() {
            info!(command = %self.command, "no target: no argument given and no raid seen yet");
            return None;
        }

        debug!(target_channel = %login, "shoutout requested");
        Some(ShoutoutJob {
            login,
            request: self.request,
            selector: self.selector.clone(),
        })
    }
}

/// Split a message into command and optional target.
///
/// `None` if the first token is not `command`. Otherwise the second token
/// with any leading `@` removed, if there is one.
pub fn parse_command<'a>(text: &'a str, command: &str) -> Option<Option<&'a str>> {
    let mut tokens = text.split_whitespace();
    if tokens.next()? != command {
        return None;
    }
    Some(
        tokens
            .next()
            .map(|arg| arg.trim_start_matches('@'))
            .filter(|arg| !arg.is_empty()),
    )
}

/// A resolved command, independent of the loop that created it
pub struct ShoutoutJob {
    login: String,
    request: SelectionRequest,
    selector: ClipSelector,
}

impl ShoutoutJob {
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Look up the user and pick a clip. `Ok(None)` when no clip qualifies.
    pub async fn run(self) -> Result<Option<Shoutout>, SelectError> {
        let user = self.selector.resolve_user(&self.login).await?;
        let clip = self.selector.choose_clip_for(&user, &self.request).await?;

        match clip {
            Some(clip) => Ok(Some(Shoutout { user, clip })),
            None => {
                warn!(
                    channel = %self.login,
                    min_views = self.request.min_view_count,
                    window_days = self.request.window_days,
                    "no clip met the view floor in any window"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_without_argument() {
        assert_eq!(parse_command("?so", "?so"), Some(None));
        assert_eq!(parse_command("  ?so  ", "?so"), Some(None));
    }

    #[test]
    fn test_parse_command_with_argument() {
        assert_eq!(parse_command("?so someStreamer", "?so"), Some(Some("someStreamer")));
        assert_eq!(parse_command("?so\t@someone extra", "?so"), Some(Some("someone")));
    }

    #[test]
    fn test_parse_command_other_text() {
        assert_eq!(parse_command("hello ?so", "?so"), None);
        assert_eq!(parse_command("?sox", "?so"), None);
        assert_eq!(parse_command("", "?so"), None);
    }

    #[test]
    fn test_parse_command_bare_at_sign() {
        assert_eq!(parse_command("?so @", "?so"), Some(None));
    }
}
