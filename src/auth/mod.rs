// 🔐 Authentication - external auth service + admin gate
//
// The dashboard never stores credentials or users itself. An `AuthService`
// talks to the managed provider; `AuthGate` turns its answers into the
// {user, is_admin, loading} state that decides route access. Every provider
// call is bounded by a timeout so the UI cannot hang.

pub mod memory;
pub mod supabase;

pub use memory::{MemoryAuth, UserDirectory};
pub use supabase::SupabaseAuth;

use crate::config::AuthConfig;
use crate::dashboard::RouteDecision;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Role value that grants dashboard access.
pub const ADMIN_ROLE: &str = "admin";

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn email_or_id(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_unix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStateChange {
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Access denied. Admin role required.")]
    AccessDenied,

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("Not signed in")]
    NotSignedIn,

    /// Message reported by the provider
    #[error("{0}")]
    Provider(String),

    #[error("auth request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Text shown on the login form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Http(_) => "Failed to login. Please check your credentials.".to_string(),
            other => other.to_string(),
        }
    }
}

/// The managed authentication/user-store service.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Current session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Auth state changes caused by this client.
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;

    /// The user's role attribute from the user store.
    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, AuthError>;
}

// ============================================================================
// AUTH GATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_admin: bool,
    pub loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        AuthState { user: None, is_admin: false, loading: true }
    }

    pub fn signed_out() -> Self {
        AuthState { user: None, is_admin: false, loading: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub role_check: Duration,
    pub session: Duration,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        AuthTimeouts {
            role_check: Duration::from_secs(3),
            session: Duration::from_secs(5),
        }
    }
}

impl From<&AuthConfig> for AuthTimeouts {
    fn from(config: &AuthConfig) -> Self {
        AuthTimeouts {
            role_check: config.role_check_timeout(),
            session: config.session_timeout(),
        }
    }
}

pub struct AuthGate {
    service: Arc<dyn AuthService>,
    state: RwLock<AuthState>,
    timeouts: AuthTimeouts,
}

impl AuthGate {
    pub fn new(service: Arc<dyn AuthService>, timeouts: AuthTimeouts) -> Self {
        AuthGate {
            service,
            state: RwLock::new(AuthState::loading()),
            timeouts,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn decision(&self) -> RouteDecision {
        RouteDecision::for_state(&self.state())
    }

    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    fn set_state(&self, next: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn finish_loading(&self) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).loading = false;
    }

    /// Restore an existing session. Always leaves `loading` cleared.
    pub async fn initialize(&self) {
        if timeout(self.timeouts.session, self.restore_session()).await.is_err() {
            warn!("auth check timeout - continuing without session");
            self.finish_loading();
        }
    }

    async fn restore_session(&self) {
        match self.service.get_session().await {
            Ok(Some(session)) => self.adopt_session(session).await,
            Ok(None) => {
                debug!("no active session");
                self.set_state(AuthState::signed_out());
            }
            Err(e) => {
                error!(error = %e, "error getting session");
                self.set_state(AuthState::signed_out());
            }
        }
    }

    async fn adopt_session(&self, session: Session) {
        let is_admin = self.check_admin_role(&session.user.id).await;
        self.set_state(AuthState {
            user: Some(session.user),
            is_admin,
            loading: false,
        });
    }

    /// Role lookup bounded by the role-check timeout. Errors and timeouts
    /// count as "not admin".
    pub async fn check_admin_role(&self, user_id: &str) -> bool {
        match timeout(self.timeouts.role_check, self.service.fetch_role(user_id)).await {
            Ok(Ok(role)) => role.as_deref() == Some(ADMIN_ROLE),
            Ok(Err(e)) => {
                error!(user_id, error = %e, "error checking admin role");
                false
            }
            Err(_) => {
                error!(user_id, "admin role check timeout");
                false
            }
        }
    }

    /// Sign in and require the admin role. Non-admins are signed out again.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = timeout(
            self.timeouts.session,
            self.service.sign_in_with_password(email, password),
        )
        .await
        .map_err(|_| AuthError::Timeout("sign-in"))??;

        let user = session.user.clone();
        if !self.check_admin_role(&user.id).await {
            warn!(email, "login rejected: admin role required");
            if let Err(e) = self.service.sign_out().await {
                warn!(error = %e, "sign-out after rejected login failed");
            }
            self.set_state(AuthState::signed_out());
            return Err(AuthError::AccessDenied);
        }

        info!(email, "admin signed in");
        self.set_state(AuthState {
            user: Some(user.clone()),
            is_admin: true,
            loading: false,
        });
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.service.sign_out().await?;
        self.set_state(AuthState::signed_out());
        info!("signed out");
        Ok(())
    }

    /// Re-read the provider's session for a signed-in gate. The provider
    /// refreshes an expired token here; a missing session, an error or a
    /// timeout signs the gate out.
    pub async fn revalidate(&self) -> RouteDecision {
        let Some(current) = self.user() else {
            return self.decision();
        };

        match timeout(self.timeouts.session, self.service.get_session()).await {
            Ok(Ok(Some(session))) => {
                if session.user != current {
                    self.adopt_session(session).await;
                }
            }
            Ok(Ok(None)) => {
                info!(user_id = %current.id, "session ended at provider");
                self.set_state(AuthState::signed_out());
            }
            Ok(Err(e)) => {
                warn!(error = %e, "session revalidation failed");
                self.set_state(AuthState::signed_out());
            }
            Err(_) => {
                warn!("session revalidation timeout");
                self.set_state(AuthState::signed_out());
            }
        }
        self.decision()
    }

    pub async fn apply_change(&self, change: AuthStateChange) {
        match change {
            AuthStateChange::SignedIn(session) | AuthStateChange::TokenRefreshed(session) => {
                self.adopt_session(session).await
            }
            AuthStateChange::SignedOut => self.set_state(AuthState::signed_out()),
        }
    }

    /// Follow the provider's state changes until the gate is dropped or the
    /// provider closes its channel.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.service.subscribe();
        let gate: Weak<AuthGate> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => {
                        let Some(gate) = gate.upgrade() else { break };
                        gate.apply_change(change).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("auth listener stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAccount;

    fn accounts() -> Vec<UserAccount> {
        vec![
            UserAccount {
                email: "admin@neurazor.com".to_string(),
                password: "correct-horse".to_string(),
                role: "admin".to_string(),
            },
            UserAccount {
                email: "viewer@neurazor.com".to_string(),
                password: "battery-staple".to_string(),
                role: "user".to_string(),
            },
        ]
    }

    fn gate() -> (Arc<MemoryAuth>, AuthGate) {
        let directory = Arc::new(UserDirectory::from_accounts(&accounts()));
        let service = Arc::new(MemoryAuth::new(directory));
        let gate = AuthGate::new(service.clone(), AuthTimeouts::default());
        (service, gate)
    }

    /// Provider whose role lookup never answers in time.
    struct SlowRoles {
        inner: MemoryAuth,
        delay: Duration,
    }

    #[async_trait]
    impl AuthService for SlowRoles {
        async fn get_session(&self) -> Result<Option<Session>, AuthError> {
            self.inner.get_session().await
        }

        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            self.inner.sign_in_with_password(email, password).await
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.inner.sign_out().await
        }

        fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
            self.inner.subscribe()
        }

        async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, AuthError> {
            tokio::time::sleep(self.delay).await;
            self.inner.fetch_role(user_id).await
        }
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let (_, gate) = gate();
        assert_eq!(gate.state(), AuthState::loading());
        assert_eq!(gate.decision(), RouteDecision::Loading);
    }

    #[tokio::test]
    async fn test_initialize_without_session() {
        let (_, gate) = gate();
        gate.initialize().await;
        assert_eq!(gate.state(), AuthState::signed_out());
        assert_eq!(gate.decision(), RouteDecision::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_admin_login() {
        let (_, gate) = gate();
        let user = gate.login("admin@neurazor.com", "correct-horse").await.unwrap();

        assert_eq!(user.email.as_deref(), Some("admin@neurazor.com"));
        let state = gate.state();
        assert!(state.is_admin);
        assert!(!state.loading);
        assert_eq!(gate.decision(), RouteDecision::Allow);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let (_, gate) = gate();
        let err = gate.login("admin@neurazor.com", "wrong").await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.user_message(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected_and_signed_out() {
        let (service, gate) = gate();
        let err = gate.login("viewer@neurazor.com", "battery-staple").await.unwrap_err();

        assert!(matches!(err, AuthError::AccessDenied));
        assert_eq!(err.user_message(), "Access denied. Admin role required.");
        assert_eq!(service.get_session().await.unwrap(), None);
        assert_eq!(gate.state(), AuthState::signed_out());
    }

    #[tokio::test]
    async fn test_existing_session_is_restored() {
        let (service, gate) = gate();
        service.sign_in_with_password("admin@neurazor.com", "correct-horse").await.unwrap();

        gate.initialize().await;
        let state = gate.state();
        assert!(state.is_admin);
        assert_eq!(state.user.unwrap().email.as_deref(), Some("admin@neurazor.com"));
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let (service, gate) = gate();
        gate.login("admin@neurazor.com", "correct-horse").await.unwrap();
        gate.logout().await.unwrap();

        assert_eq!(gate.state(), AuthState::signed_out());
        assert_eq!(service.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revalidate_keeps_live_session() {
        let (_, gate) = gate();
        gate.login("admin@neurazor.com", "correct-horse").await.unwrap();

        assert_eq!(gate.revalidate().await, RouteDecision::Allow);
        assert!(gate.state().is_admin);
    }

    #[tokio::test]
    async fn test_revalidate_signs_out_when_provider_session_is_gone() {
        let (service, gate) = gate();
        gate.login("admin@neurazor.com", "correct-horse").await.unwrap();

        // No listener: the gate only learns about this on revalidation
        service.sign_out().await.unwrap();
        assert_eq!(gate.decision(), RouteDecision::Allow);

        assert_eq!(gate.revalidate().await, RouteDecision::RedirectToLogin);
        assert_eq!(gate.state(), AuthState::signed_out());
    }

    #[tokio::test]
    async fn test_revalidate_without_user_is_a_no_op() {
        let (_, gate) = gate();
        gate.initialize().await;
        assert_eq!(gate.revalidate().await, RouteDecision::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_role_check_timeout_means_not_admin() {
        let directory = Arc::new(UserDirectory::from_accounts(&accounts()));
        let service = Arc::new(SlowRoles {
            inner: MemoryAuth::new(directory),
            delay: Duration::from_millis(500),
        });
        let gate = AuthGate::new(
            service,
            AuthTimeouts {
                role_check: Duration::from_millis(20),
                session: Duration::from_secs(5),
            },
        );

        let err = gate.login("admin@neurazor.com", "correct-horse").await.unwrap_err();
        assert!(matches!(err, AuthError::AccessDenied));
    }

    #[tokio::test]
    async fn test_initialize_times_out_and_stops_loading() {
        let directory = Arc::new(UserDirectory::from_accounts(&accounts()));
        let inner = MemoryAuth::new(directory);
        inner.sign_in_with_password("admin@neurazor.com", "correct-horse").await.unwrap();

        let service = Arc::new(SlowRoles { inner, delay: Duration::from_millis(500) });
        let gate = AuthGate::new(
            service,
            AuthTimeouts {
                role_check: Duration::from_secs(5),
                session: Duration::from_millis(20),
            },
        );

        gate.initialize().await;
        assert!(!gate.state().loading);
        assert_eq!(gate.decision(), RouteDecision::RedirectToLogin);
    }

    #[tokio::test]
    async fn test_listener_follows_provider_events() {
        let directory = Arc::new(UserDirectory::from_accounts(&accounts()));
        let service = Arc::new(MemoryAuth::new(directory));
        let gate = Arc::new(AuthGate::new(service.clone(), AuthTimeouts::default()));
        let listener = gate.listen();

        service.sign_in_with_password("admin@neurazor.com", "correct-horse").await.unwrap();
        for _ in 0..50 {
            if gate.state().is_admin {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gate.decision(), RouteDecision::Allow);

        service.sign_out().await.unwrap();
        for _ in 0..50 {
            if gate.state().user.is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(gate.state(), AuthState::signed_out());

        drop(gate);
        drop(service);
        tokio::time::timeout(Duration::from_secs(1), listener).await.unwrap().unwrap();
    }
}
