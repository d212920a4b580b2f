use super::{SessionHub, SessionSubscription, SessionUser};

/// Client-side navigation target for an unauthenticated visitor.
pub trait Navigator {
    fn navigate(&mut self, path: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Authenticated(SessionUser),
    /// Terminal until the gate is remounted.
    Unauthenticated,
}

/// Blocks protected content until the session is known, then either lets it
/// through or sends the visitor to the login path.
pub struct SessionGate<N: Navigator> {
    state: GateState,
    navigator: N,
    login_path: String,
    subscription: Option<SessionSubscription>,
}

impl<N: Navigator> SessionGate<N> {
    /// Gate fed by the caller only (one request, one session lookup).
    pub fn new(navigator: N, login_path: impl Into<String>) -> Self {
        Self {
            state: GateState::Loading,
            navigator,
            login_path: login_path.into(),
            subscription: None,
        }
    }

    /// Gate that also follows hub changes for its user. Holds one hub
    /// subscription until `unmount` or drop.
    pub fn mount(hub: &SessionHub, navigator: N, login_path: impl Into<String>) -> Self {
        let mut gate = Self::new(navigator, login_path);
        gate.subscription = Some(hub.subscribe());
        gate
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == GateState::Loading
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match &self.state {
            GateState::Authenticated(u) => Some(u),
            _ => None,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Apply a session event.
    pub fn on_session(&mut self, session: Option<SessionUser>) -> &GateState {
        match (&self.state, session) {
            (GateState::Unauthenticated, _) => {}
            (_, Some(user)) => {
                self.state = GateState::Authenticated(user);
            }
            (GateState::Loading | GateState::Authenticated(_), None) => {
                self.state = GateState::Unauthenticated;
                tracing::debug!(to = %self.login_path, "session gate redirect");
                self.navigator.navigate(&self.login_path);
            }
        }
        &self.state
    }

    /// Protected content, only once authenticated.
    pub fn render<T>(&self, content: T) -> Option<T> {
        self.user().map(|_| content)
    }

    /// Wait for the next hub change addressed to the current user and apply
    /// it. `None` when not mounted, not authenticated, or the hub is gone.
    pub async fn next_change(&mut self) -> Option<&GateState> {
        loop {
            let uid = self.user()?.uid;
            let change = self.subscription.as_mut()?.next().await?;
            if change.uid == uid {
                return Some(self.on_session(change.user));
            }
        }
    }

    /// Tear down, releasing the hub subscription if any.
    pub fn unmount(self) -> N {
        if let Some(sub) = self.subscription {
            sub.release();
        }
        self.navigator
    }
}

/// Navigator that remembers the last requested path, for answering an HTTP
/// request with a redirect.
#[derive(Debug, Default)]
pub struct RedirectTarget(pub Option<String>);

impl Navigator for RedirectTarget {
    fn navigate(&mut self, path: &str) {
        self.0 = Some(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingNavigator {
        paths: Vec<String>,
    }

    impl Navigator for CountingNavigator {
        fn navigate(&mut self, path: &str) {
            self.paths.push(path.to_string());
        }
    }

    fn user() -> SessionUser {
        SessionUser {
            uid: Uuid::new_v4(),
            email: "dev@example.com".into(),
            display_name: Some("Dev".into()),
            photo_url: None,
        }
    }

    #[test]
    fn starts_loading_and_renders_nothing() {
        let gate = SessionGate::new(CountingNavigator::default(), "/login");
        assert!(gate.is_loading());
        assert_eq!(gate.render("content"), None);
        assert!(gate.navigator().paths.is_empty());
    }

    #[test]
    fn no_session_navigates_to_login_exactly_once() {
        let mut gate = SessionGate::new(CountingNavigator::default(), "/login");
        assert_eq!(gate.on_session(None), &GateState::Unauthenticated);
        // terminal: later events change nothing
        gate.on_session(None);
        gate.on_session(Some(user()));
        assert_eq!(gate.state(), &GateState::Unauthenticated);
        assert_eq!(gate.render("content"), None);
        assert_eq!(gate.navigator().paths, vec!["/login".to_string()]);
    }

    #[test]
    fn session_renders_without_navigation() {
        let mut gate = SessionGate::new(CountingNavigator::default(), "/login");
        let u = user();
        gate.on_session(Some(u.clone()));
        assert_eq!(gate.user(), Some(&u));
        assert_eq!(gate.render("content"), Some("content"));
        assert!(gate.navigator().paths.is_empty());
    }

    #[test]
    fn sign_out_after_sign_in_redirects_once() {
        let mut gate = SessionGate::new(CountingNavigator::default(), "/login");
        gate.on_session(Some(user()));
        gate.on_session(None);
        gate.on_session(None);
        assert_eq!(gate.navigator().paths.len(), 1);
    }

    #[test]
    fn mount_unmount_releases_subscription_once() {
        let hub = SessionHub::new();
        for _ in 0..3 {
            let gate = SessionGate::mount(&hub, CountingNavigator::default(), "/login");
            assert_eq!(hub.active_subscriptions(), 1);
            gate.unmount();
            assert_eq!(hub.active_subscriptions(), 0);
        }
        {
            let _gate = SessionGate::mount(&hub, CountingNavigator::default(), "/login");
            assert_eq!(hub.active_subscriptions(), 1);
        }
        assert_eq!(hub.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn mounted_gate_follows_sign_out() {
        let hub = SessionHub::new();
        let mut gate = SessionGate::mount(&hub, CountingNavigator::default(), "/login");
        let u = user();
        gate.on_session(Some(u.clone()));

        hub.signed_out(Uuid::new_v4()); // someone else
        hub.signed_out(u.uid);

        assert_eq!(gate.next_change().await, Some(&GateState::Unauthenticated));
        let nav = gate.unmount();
        assert_eq!(nav.paths, vec!["/login".to_string()]);
        assert_eq!(hub.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn unmounted_gate_has_no_changes() {
        let mut gate = SessionGate::new(RedirectTarget::default(), "/login");
        gate.on_session(Some(user()));
        assert!(gate.next_change().await.is_none());
    }
}
