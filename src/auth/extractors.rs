use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::warn;

use super::{claims::TokenKind, jwt::JwtKeys, repo::User};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// `Bearer <token>` from the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// User behind the request's access token, provided the token's session has
/// not been ended since it was signed.
pub(crate) async fn session_owner(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let token = bearer_token(headers).ok_or_else(|| AppError::unauthenticated("Missing Authorization header"))?;
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify_kind(token, TokenKind::Access).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::unauthenticated("Invalid or expired token")
    })?;

    let user = User::find_by_id(state.store.as_ref(), claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthenticated("Invalid or expired token"))?;
    if !user.session_current(claims.epoch) {
        warn!(user_id = %user.id, epoch = claims.epoch, "token from an ended session");
        return Err(AppError::unauthenticated("Session has ended. Please log in again."));
    }
    Ok(user)
}

/// Extracts the signed-in user from a valid access JWT.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        session_owner(&state, &parts.headers).await.map(AuthUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::UserRecord;
    use axum::http::{header, HeaderValue, StatusCode};

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    fn with_token(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn stale_epoch_is_refused() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let mut user = User::create(state.store.as_ref(), UserRecord::default()).await.unwrap();
        let token = keys.sign_access(user.id, 0).unwrap();
        assert_eq!(session_owner(&state, &with_token(&token)).await.unwrap().id, user.id);

        user.end_sessions();
        user.save(state.store.as_ref()).await.unwrap();
        let err = session_owner(&state, &with_token(&token)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let state = AppState::fake();
        let err = session_owner(&state, &HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Missing Authorization header");
    }
}
