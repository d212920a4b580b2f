//! Process-wide session state: one hub broadcasting sign-in / sign-out
//! changes, and the gate that guards dashboard routes.

pub mod gate;
pub mod middleware;
pub mod stream;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Identity as seen by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub uid: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl SessionUser {
    pub fn name_or_anonymous(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
    }
}

/// A change of session for one user. `user` is `None` on sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub uid: Uuid,
    pub user: Option<SessionUser>,
}

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct SessionHub {
    tx: broadcast::Sender<SessionChange>,
    active: Arc<AtomicUsize>,
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn subscribe(&self) -> SessionSubscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        SessionSubscription {
            rx: self.tx.subscribe(),
            active: Some(self.active.clone()),
        }
    }

    pub fn signed_in(&self, user: SessionUser) {
        self.publish(SessionChange {
            uid: user.uid,
            user: Some(user),
        });
    }

    pub fn signed_out(&self, uid: Uuid) {
        self.publish(SessionChange { uid, user: None });
    }

    fn publish(&self, change: SessionChange) {
        // no receivers is fine
        let receivers = self.tx.send(change).unwrap_or(0);
        tracing::debug!(receivers, "session change published");
    }

    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Live subscription to the hub. Released exactly once, by `release` or drop.
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionChange>,
    active: Option<Arc<AtomicUsize>>,
}

impl SessionSubscription {
    /// Next change, skipping over any the receiver lagged behind on.
    /// `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<SessionChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "session subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(active) = self.active.take() {
            active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release_once();
    }
}
