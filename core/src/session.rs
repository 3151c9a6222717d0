//! In-memory session state and its rehydration through the profile probe.

use std::sync::Arc;

use helpdesk_protocol::Role;
use helpdesk_protocol::User;
use tokio::sync::watch;

use crate::client::ApiClient;
use crate::endpoints::Profile;
use crate::error::ClientError;
use crate::route_guard;
use crate::route_guard::GuardDecision;

/// Who is signed in, if anyone. Authenticated iff `user` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

/// Process-wide session holder. Clones share state.
///
/// The only transitions are `set_credentials` (anonymous to authenticated)
/// and `clear` (back to anonymous).
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.tx.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Idempotent: storing the same user again notifies nobody.
    pub fn set_credentials(&self, user: User) {
        self.tx.send_if_modified(|session| {
            if session.user.as_ref() == Some(&user) {
                return false;
            }
            tracing::info!(user = %user.email, role = %user.role, "session authenticated");
            session.user = Some(user);
            true
        });
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|session| {
            if session.user.is_none() {
                return false;
            }
            tracing::info!("session cleared");
            session.user = None;
            true
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Authenticated(User),
    /// The probe failed; the session is now empty and the view should go to
    /// the login page. Carries the probe error when there was one.
    RedirectToLogin(Option<ClientError>),
}

/// Rehydrate the session when a protected view mounts.
///
/// An existing session is returned as is. Otherwise the profile is probed
/// (always over the network, never from cache); success stores the user,
/// any failure clears the session.
pub async fn bootstrap(client: &ApiClient) -> BootstrapOutcome {
    let session = client.session();
    if let Some(user) = session.current_user() {
        return BootstrapOutcome::Authenticated(user);
    }

    match client.refetch(&Profile).await {
        Ok(response) => match response.into_data() {
            Some(user) => {
                session.set_credentials(user.clone());
                BootstrapOutcome::Authenticated(user)
            }
            None => {
                session.clear();
                BootstrapOutcome::RedirectToLogin(None)
            }
        },
        Err(err) => {
            tracing::warn!("profile probe failed: {err}");
            session.clear();
            BootstrapOutcome::RedirectToLogin(Some(err))
        }
    }
}

/// Full gate for rendering `path`: the coarse marker check, then bootstrap
/// and the role check for protected sections.
///
/// A bare role root is gated as its landing page, so the returned redirect
/// is the final destination (a manager opening `/admin` ends up on
/// `/manager/tickets`, not on `/admin/triage`).
pub async fn authorize_view(client: &ApiClient, path: &str) -> GuardDecision {
    let Some(landing) = route_guard::role_root_target(path) else {
        return gate(client, path).await;
    };
    match gate(client, landing).await {
        GuardDecision::Allow => GuardDecision::Redirect(landing.to_string()),
        redirect => redirect,
    }
}

async fn gate(client: &ApiClient, path: &str) -> GuardDecision {
    let coarse = route_guard::evaluate(path, client.has_session_marker());
    if !coarse.is_allow() || !route_guard::is_protected(path) {
        return coarse;
    }
    match bootstrap(client).await {
        BootstrapOutcome::Authenticated(user) => route_guard::check_role(path, user.role),
        BootstrapOutcome::RedirectToLogin(_) => {
            GuardDecision::Redirect(route_guard::LOGIN_PATH.to_string())
        }
    }
}
