// In-memory auth provider - demo mode and tests
//
// A shared `UserDirectory` plays the user store; each `MemoryAuth` is one
// client with its own session, like one browser talking to the provider.

use super::{AuthError, AuthService, AuthStateChange, Session, User};
use crate::config::UserAccount;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Session lifetime handed out by the in-memory provider.
const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct DirectoryEntry {
    user: User,
    password: String,
    role: Option<String>,
}

#[derive(Debug, Default)]
pub struct UserDirectory {
    entries: Vec<DirectoryEntry>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: &[UserAccount]) -> Self {
        let mut directory = UserDirectory::new();
        for account in accounts {
            directory.add_user(&account.email, &account.password, Some(&account.role));
        }
        directory
    }

    /// Add a user and return its id. `role: None` models a user with no row
    /// in the users table.
    pub fn add_user(&mut self, email: &str, password: &str, role: Option<&str>) -> String {
        let id = Uuid::new_v4().to_string();
        self.entries.push(DirectoryEntry {
            user: User {
                id: id.clone(),
                email: Some(email.to_string()),
            },
            password: password.to_string(),
            role: role.map(str::to_string),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn authenticate(&self, email: &str, password: &str) -> Option<&User> {
        self.entries
            .iter()
            .find(|e| e.user.email.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(email)) && e.password == password)
            .map(|e| &e.user)
    }

    fn role_of(&self, user_id: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|e| e.user.id == user_id)
            .map(|e| e.role.as_deref())
    }
}

pub struct MemoryAuth {
    directory: Arc<UserDirectory>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl MemoryAuth {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        let (events, _) = broadcast::channel(16);
        MemoryAuth {
            directory,
            session: RwLock::new(None),
            events,
        }
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(session.filter(|s| !s.is_expired(Utc::now().timestamp())))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self
            .directory
            .authenticate(email, password)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now().timestamp() + SESSION_TTL_SECS),
            user,
        };

        self.set_session(Some(session.clone()));
        // No receivers is fine
        let _ = self.events.send(AuthStateChange::SignedIn(session.clone()));
        debug!(email, "memory provider: signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        let _ = self.events.send(AuthStateChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, AuthError> {
        match self.directory.role_of(user_id) {
            Some(role) => Ok(role.map(str::to_string)),
            None => Err(AuthError::Provider(
                "JSON object requested, multiple (or no) rows returned".to_string(),
            )),
        }
    }
}
