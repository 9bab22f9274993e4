//! API clients for Twitch
//!
//! - Helix: user lookup and paginated clip listing
//! - Auth: app access token via the client credentials grant

pub mod auth;
pub mod helix;

use async_trait::async_trait;

use crate::models::{ClipPage, TimeWindow, User};

pub use auth::{AppToken, AuthClient};
pub use helix::{HelixClient, HelixError};

/// The two Helix calls the selector and dispatcher depend on.
///
/// Implemented by [`HelixClient`] in production and by in-memory fakes in tests.
#[async_trait]
pub trait ClipGateway: Send + Sync {
    /// Look up a user by login. `Ok(None)` when the API returns no match.
    async fn get_user(&self, login: &str) -> Result<Option<User>, HelixError>;

    /// Fetch one page of clips created inside `window`.
    async fn get_clips(
        &self,
        broadcaster_id: &str,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> Result<ClipPage, HelixError>;
}
