use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{stream, Stream};
use tracing::instrument;
use uuid::Uuid;

use super::{SessionSubscription, SessionUser};
use crate::{auth::extractors::AuthUser, state::AppState};

fn session_event(user: Option<&SessionUser>) -> Event {
    let data = serde_json::to_string(&user).unwrap_or_else(|_| "null".into());
    Event::default().event("session").data(data)
}

/// Current session first, then every change for the same user. Dropping the
/// stream releases the hub subscription.
pub fn session_events(
    current: Option<SessionUser>,
    sub: SessionSubscription,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let uid: Option<Uuid> = current.as_ref().map(|u| u.uid);
    stream::unfold((Some(current), sub), move |(first, mut sub)| async move {
        if let Some(current) = first {
            return Some((Ok(session_event(current.as_ref())), (None, sub)));
        }
        let Some(uid) = uid else {
            // anonymous: nothing to follow, hold the connection until the hub closes
            while sub.next().await.is_some() {}
            return None;
        };
        loop {
            let change = sub.next().await?;
            if change.uid == uid {
                return Some((Ok(session_event(change.user.as_ref())), (None, sub)));
            }
        }
    })
}

/// `GET /auth/session`: server-sent session changes.
#[instrument(skip(state, auth))]
pub async fn session_stream(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let current = auth.map(|AuthUser(user)| user.session_user());
    let sub = state.sessions.subscribe();
    Sse::new(session_events(current, sub)).keep_alive(KeepAlive::default())
}
