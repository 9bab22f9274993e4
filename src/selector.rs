//! Clip selection across expanding time windows
//!
//! Starting at "now", each attempt searches one window of `window_days`
//! further back in time until a clip reaches the view floor or the attempt
//! budget runs out. Running out is a normal "no clip" result.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ClipGateway, HelixError};
use crate::models::{ChoiceRule, Clip, SelectionRequest, TimeWindow, User};

/// Number of windows searched before giving up
pub const MAX_ATTEMPTS: u32 = 10;

/// Selection failures. "No clip found" is not one of them.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Api(#[from] HelixError),
}

/// Picks one clip for a channel through a [`ClipGateway`]
#[derive(Clone)]
pub struct ClipSelector {
    gateway: Arc<dyn ClipGateway>,
}

impl ClipSelector {
    pub fn new(gateway: Arc<dyn ClipGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve a login to its user record
    pub async fn resolve_user(&self, login: &str) -> Result<User, SelectError> {
        self.gateway
            .get_user(login)
            .await?
            .ok_or_else(|| SelectError::UserNotFound(login.to_string()))
    }

    /// Resolve `login` and choose a clip from its channel
    pub async fn choose_clip(
        &self,
        login: &str,
        request: &SelectionRequest,
    ) -> Result<Option<Clip>, SelectError> {
        let user = self.resolve_user(login).await?;
        self.choose_clip_for(&user, request).await
    }

    /// Choose a clip for an already resolved user
    pub async fn choose_clip_for(
        &self,
        user: &User,
        request: &SelectionRequest,
    ) -> Result<Option<Clip>, SelectError> {
        let mut rng = StdRng::from_os_rng();
        self.choose_clip_at(user, request, Utc::now(), &mut rng)
            .await
    }

    /// Same as [`choose_clip_for`](Self::choose_clip_for) with an explicit clock and RNG
    pub async fn choose_clip_at<R: Rng + Send>(
        &self,
        user: &User,
        request: &SelectionRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<Clip>, SelectError> {
        for attempt in 0..MAX_ATTEMPTS {
            let Some(window) = request.window(now, attempt) else {
                debug!(channel = %user.login, attempt, "window before earliest date, stopping");
                break;
            };
            let candidates = self
                .collect_candidates(&user.id, &window, request.min_view_count)
                .await?;

            if candidates.is_empty() {
                debug!(channel = %user.login, attempt, %window, "no candidates in window");
                continue;
            }

            let count = candidates.len();
            let Some(chosen) = pick(candidates, request.rule, rng) else {
                continue;
            };

            if chosen.view_count >= request.min_view_count {
                info!(
                    channel = %user.login,
                    attempt,
                    candidates = count,
                    views = chosen.view_count,
                    rule = %request.rule,
                    "clip chosen"
                );
                return Ok(Some(chosen));
            }
        }

        Ok(None)
    }

    /// Page through one window, keeping clips at or above the floor
    async fn collect_candidates(
        &self,
        broadcaster_id: &str,
        window: &TimeWindow,
        min_view_count: u64,
    ) -> Result<Vec<Clip>, SelectError> {
        let mut candidates = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();
        let mut pages = 0u32;

        loop {
            let page = self
                .gateway
                .get_clips(broadcaster_id, window, cursor.as_deref())
                .await?;
            pages += 1;

            candidates.extend(
                page.clips
                    .into_iter()
                    .filter(|clip| clip.view_count >= min_view_count),
            );

            match page.cursor {
                Some(next) if !seen.insert(next.clone()) => {
                    return Err(HelixError::InvalidResponse(format!(
                        "pagination cursor repeated after {} pages: {}",
                        pages, next
                    ))
                    .into());
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(%window, pages, candidates = candidates.len(), "window scanned");
        Ok(candidates)
    }
}

/// Apply a choice rule to a candidate set
pub fn pick<R: Rng + ?Sized>(mut candidates: Vec<Clip>, rule: ChoiceRule, rng: &mut R) -> Option<Clip> {
    match rule {
        ChoiceRule::Random => {
            if candidates.is_empty() {
                return None;
            }
            let idx = rng.random_range(0..candidates.len());
            Some(candidates.swap_remove(idx))
        }
        ChoiceRule::MostPopular => candidates.into_iter().reduce(|best, clip| {
            if clip.view_count > best.view_count {
                clip
            } else {
                best
            }
        }),
    }
}
