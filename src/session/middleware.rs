use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use super::{
    gate::{RedirectTarget, SessionGate},
    SessionUser,
};
use crate::{
    auth::extractors::session_owner,
    state::AppState,
};

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}

/// Session behind the request's access token; any failure counts as none.
async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    match session_owner(state, headers).await {
        Ok(user) => Some(user.session_user()),
        Err(e) => {
            tracing::debug!(error = %e, "no session");
            None
        }
    }
}

/// Guards dashboard routes. Authenticated requests continue with the
/// `SessionUser` in their extensions; others are sent to the login path.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut gate = SessionGate::new(RedirectTarget::default(), state.config.login_path.clone());
    let session = resolve_session(&state, req.headers()).await;

    gate.on_session(session);
    if let Some(user) = gate.user().cloned() {
        req.extensions_mut().insert(user);
        return next.run(req).await;
    }

    let RedirectTarget(target) = gate.unmount();
    let login = target.unwrap_or_else(|| state.config.login_path.clone());
    if wants_html(req.headers()) {
        Redirect::to(&login).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "You must be logged in.", "redirect": login })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, auth::jwt::JwtKeys};
    use axum::{body::Body, extract::FromRef, http::Request as HttpRequest};
    use tower::ServiceExt;

    #[tokio::test]
    async fn html_clients_are_redirected_to_login() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                HttpRequest::get("/api/v1/dashboard/jobs")
                    .header(header::ACCEPT, "text/html,application/xhtml+xml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn api_clients_get_401_with_redirect_hint() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                HttpRequest::get("/api/v1/dashboard/blogs")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["redirect"], "/login");
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_no_session() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(uuid::Uuid::new_v4(), 0).unwrap();
        assert!(resolve_session(&state, &{
            let mut h = HeaderMap::new();
            h.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
            h
        })
        .await
        .is_none());
    }
}
