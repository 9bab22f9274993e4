//! Twitch Helix API client
//!
//! Only the two endpoints the bot needs: `GET /users` and `GET /clips`.
//! API docs: https://dev.twitch.tv/docs/api/reference

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::ClipGateway;
use crate::models::{Clip, ClipPage, TimeWindow, User};

/// Largest page size the clips endpoint accepts
const CLIPS_PAGE_SIZE: u32 = 100;

pub(super) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Helix API error types
#[derive(Error, Debug)]
pub enum HelixError {
    #[error("Unauthorized ({0}): check client id and token")]
    Unauthorized(u16),

    #[error("Rate limited (429)")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Helix API client authenticated with an app access token
pub struct HelixClient {
    client_id: String,
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl HelixClient {
    /// Create a new Helix client
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self, HelixError> {
        Self::with_base_url(client_id, access_token, "https://api.twitch.tv/helix")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(
        client_id: impl Into<String>,
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, HelixError> {
        Ok(Self {
            client_id: client_id.into(),
            access_token: access_token.into(),
            base_url: base_url.into(),
            client: build_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, HelixError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Make an authenticated GET request and decode the JSON body
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T, HelixError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "helix request");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Client-Id", &self.client_id)
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                serde_json::from_str(&body)
                    .map_err(|e| HelixError::InvalidResponse(format!("JSON parse error: {}", e)))
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(HelixError::Unauthorized(status.as_u16()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(HelixError::RateLimited),
            status if status.is_server_error() => Err(HelixError::ServerError(status.as_u16())),
            status => Err(HelixError::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Look up a single user by login name
    pub async fn user(&self, login: &str) -> Result<Option<User>, HelixError> {
        let endpoint = format!("/users?login={}", urlencoding::encode(login));
        let response: UsersResponse = self.get(&endpoint).await?;
        Ok(response.data.into_iter().next())
    }

    /// Get one page of clips for a broadcaster inside a time window
    pub async fn clips(
        &self,
        broadcaster_id: &str,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> Result<ClipPage, HelixError> {
        let mut endpoint = format!(
            "/clips?broadcaster_id={}&started_at={}&ended_at={}&first={}",
            urlencoding::encode(broadcaster_id),
            urlencoding::encode(&window.started_at_rfc3339()),
            urlencoding::encode(&window.ended_at_rfc3339()),
            CLIPS_PAGE_SIZE,
        );
        if let Some(cursor) = cursor {
            endpoint.push_str(&format!("&after={}", urlencoding::encode(cursor)));
        }

        let response: ClipsResponse = self.get(&endpoint).await?;
        Ok(response.into_page())
    }
}

#[async_trait]
impl ClipGateway for HelixClient {
    async fn get_user(&self, login: &str) -> Result<Option<User>, HelixError> {
        self.user(login).await
    }

    async fn get_clips(
        &self,
        broadcaster_id: &str,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> Result<ClipPage, HelixError> {
        self.clips(broadcaster_id, window, cursor).await
    }
}

/// HTTP client with a per-request timeout
pub(super) fn build_client(timeout: Duration) -> Result<reqwest::Client, HelixError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct ClipsResponse {
    data: Vec<Clip>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    cursor: Option<String>,
}

impl ClipsResponse {
    fn into_page(self) -> ClipPage {
        // Helix sometimes sends an empty cursor on the last page
        let cursor = self.pagination.cursor.filter(|c| !c.is_empty());
        ClipPage {
            clips: self.data,
            cursor,
        }
    }
}
