//! Google OAuth: authorization redirect, code exchange, profile fetch.

use reqwest::Url;
use serde::Deserialize;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, thiserror::Error)]
pub enum OauthError {
    #[error("google token exchange failed: {0}")]
    TokenExchange(String),
    #[error("google api error: {0}")]
    GoogleApi(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect profile of the signed-in Google account.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google authorization URL carrying the signed `state`.
pub fn authorize_url(config: &GoogleConfig, state: &str) -> String {
    Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
            ("prompt", "select_account"),
        ],
    )
    .map(String::from)
    .unwrap_or_else(|_| AUTHORIZE_URL.to_string())
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(config: &GoogleConfig, code: &str) -> Result<String, OauthError> {
    let client = reqwest::Client::new();
    let resp = client
        .post(TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| OauthError::TokenExchange(e.to_string()))?;

    let body = resp
        .text()
        .await
        .map_err(|e| OauthError::TokenExchange(e.to_string()))?;
    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|_| OauthError::TokenExchange(format!("unexpected response: {body}")))?;
    Ok(token.access_token)
}

/// Fetch the profile behind an access token.
pub async fn fetch_profile(access_token: &str) -> Result<GoogleProfile, OauthError> {
    let client = reqwest::Client::new();
    let resp = client
        .get(USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OauthError::GoogleApi(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(OauthError::GoogleApi(format!("{status}: {body}")));
    }

    resp.json::<GoogleProfile>()
        .await
        .map_err(|e| OauthError::GoogleApi(e.to_string()))
}
