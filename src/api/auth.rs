//! Twitch OAuth app access token
//!
//! Client credentials grant, called once at startup.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::helix::{build_client, DEFAULT_TIMEOUT};
use super::HelixError;

/// Token returned by the client credentials grant
#[derive(Debug, Clone, Deserialize)]
pub struct AppToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Client for `id.twitch.tv/oauth2`
pub struct AuthClient {
    base_url: String,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new() -> Result<Self, HelixError> {
        Self::with_base_url("https://id.twitch.tv/oauth2")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, HelixError> {
        Ok(Self {
            base_url: base_url.into(),
            client: build_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, HelixError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Exchange client id and secret for an app access token
    pub async fn app_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AppToken, HelixError> {
        let url = format!("{}/token", self.base_url);
        let body = format!(
            "client_id={}&client_secret={}&grant_type=client_credentials",
            urlencoding::encode(client_id),
            urlencoding::encode(client_secret),
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let text = response.text().await?;
                let token: AppToken = serde_json::from_str(&text).map_err(|e| {
                    HelixError::InvalidResponse(format!("JSON parse error: {}", e))
                })?;
                if token.access_token.is_empty() {
                    return Err(HelixError::InvalidResponse("empty access_token".into()));
                }
                Ok(token)
            }
            status @ (StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                Err(HelixError::Unauthorized(status.as_u16()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(HelixError::RateLimited),
            status if status.is_server_error() => Err(HelixError::ServerError(status.as_u16())),
            status => Err(HelixError::UnexpectedStatus(status.as_u16())),
        }
    }
}
