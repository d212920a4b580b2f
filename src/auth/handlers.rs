use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    claims::TokenKind,
    dto::{
        AuthResponse, ConfirmResetRequest, LoginRequest, MeResponse, MessageResponse,
        OauthCallbackQuery, RefreshRequest, ResetPasswordRequest, SignupRequest,
    },
    extractors::AuthUser,
    jwt::JwtKeys,
    oauth,
    repo::User,
    services::{self, RESET_SENT},
};
use crate::{
    content::{format_date, initials},
    error::{AppError, AppResult},
    extract::AppJson,
    session::stream::session_stream,
    state::AppState,
};

const GOOGLE_FAILED: &str = "Google login failed.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/reset-password/confirm", post(confirm_reset))
        .route("/auth/google", get(google_redirect))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/session", get(session_stream))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let user = services::sign_up(state.store.as_ref(), payload).await?;
    let keys = JwtKeys::from_ref(&state);
    let resp = services::issue_tokens(&keys, &user)?;
    state.sessions.signed_in(resp.user.clone());
    Ok((StatusCode::CREATED, Json(resp)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = services::sign_in(state.store.as_ref(), &payload.email, &payload.password).await?;
    let keys = JwtKeys::from_ref(&state);
    let resp = services::issue_tokens(&keys, &user)?;
    state.sessions.signed_in(resp.user.clone());
    Ok(Json(resp))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_kind(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| AppError::unauthenticated(e.to_string()))?;

    let user = User::find_by_id(state.store.as_ref(), claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthenticated("User not found"))?;
    if !user.session_current(claims.epoch) {
        warn!(user_id = %user.id, "refresh token from an ended session");
        return Err(AppError::unauthenticated("Session has ended. Please log in again."));
    }
    Ok(Json(services::issue_tokens(&keys, &user)?))
}

/// Ends every session of the user: outstanding access and refresh tokens stop
/// working and subscribers see a sign-out.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, AuthUser(mut user): AuthUser) -> AppResult<StatusCode> {
    user.end_sessions();
    let user = user.save(state.store.as_ref()).await?;
    state.sessions.signed_out(user.id);
    tracing::info!(user_id = %user.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let keys = JwtKeys::from_ref(&state);
    services::request_password_reset(
        state.store.as_ref(),
        &keys,
        state.mailer.as_ref(),
        &state.config.public_base_url,
        &payload.email,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: RESET_SENT.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn confirm_reset(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ConfirmResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    let keys = JwtKeys::from_ref(&state);
    services::confirm_password_reset(state.store.as_ref(), &keys, payload).await?;
    Ok(Json(MessageResponse {
        message: "Password updated. You can now log in.".into(),
    }))
}

/// `GET /auth/google`: redirect to Google with a signed state.
#[instrument(skip(state))]
pub async fn google_redirect(State(state): State<AppState>) -> AppResult<Redirect> {
    let Some(google) = &state.config.google else {
        return Err(AppError::Upstream("Google sign-in is not configured".into()));
    };
    let keys = JwtKeys::from_ref(&state);
    let oauth_state = keys.sign(Uuid::new_v4(), TokenKind::OauthState)?;
    Ok(Redirect::temporary(&oauth::authorize_url(google, &oauth_state)))
}

/// `GET /auth/google/callback`: exchange the code, upsert the user, issue tokens.
#[instrument(skip(state, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<OauthCallbackQuery>,
) -> AppResult<Json<AuthResponse>> {
    let Some(google) = &state.config.google else {
        return Err(AppError::Upstream("Google sign-in is not configured".into()));
    };
    let keys = JwtKeys::from_ref(&state);

    let state_ok = params
        .state
        .as_deref()
        .map(|s| keys.verify_kind(s, TokenKind::OauthState).is_ok())
        .unwrap_or(false);
    if !state_ok {
        warn!("oauth state missing or invalid");
        return Err(AppError::validation(GOOGLE_FAILED));
    }

    let access_token = oauth::exchange_code(google, &params.code)
        .await
        .map_err(|e| {
            warn!(error = %e, "google code exchange failed");
            AppError::Upstream(GOOGLE_FAILED.into())
        })?;
    let profile = oauth::fetch_profile(&access_token).await.map_err(|e| {
        warn!(error = %e, "google profile fetch failed");
        AppError::Upstream(GOOGLE_FAILED.into())
    })?;

    let user = services::upsert_google_user(state.store.as_ref(), &profile).await?;
    let resp = services::issue_tokens(&keys, &user)?;
    state.sessions.signed_in(resp.user.clone());
    Ok(Json(resp))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    let member_since = format_date(user.created_at);
    let session = user.session_user();
    let name = session.name_or_anonymous().to_string();
    Json(MeResponse {
        uid: session.uid,
        initials: initials(&name),
        name,
        email: session.email,
        avatar: session.photo_url,
        member_since,
    })
}
