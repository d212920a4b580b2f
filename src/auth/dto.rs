use serde::{Deserialize, Serialize};

use crate::session::SessionUser;

/// Request body for sign-up.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmResetRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

/// Response returned after login, sign-up, OAuth or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Current user as shown in the navigation menu.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub uid: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub initials: String,
    /// Account creation date, e.g. `October 19, 2026`.
    pub member_since: String,
}
