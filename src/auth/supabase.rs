// Supabase provider - GoTrue for sessions, PostgREST for the role lookup

use super::{AuthError, AuthService, AuthStateChange, Session, User};
use crate::config::{AuthConfig, ConfigError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Token endpoint payload.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now_unix: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now_unix + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error bodies differ between GoTrue versions and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn parse_error(status: StatusCode, body: &str) -> AuthError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let invalid_grant = parsed.error.as_deref() == Some("invalid_grant")
        || parsed.error_code.as_deref() == Some("invalid_credentials");
    if status == StatusCode::BAD_REQUEST && invalid_grant {
        return AuthError::InvalidCredentials;
    }

    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| format!("provider returned {}", status));
    AuthError::Provider(message)
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    #[serde(default)]
    role: Option<String>,
}

pub struct SupabaseAuth {
    http: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl SupabaseAuth {
    pub fn new(http: Client, base_url: &str, anon_key: &str) -> Self {
        let (events, _) = broadcast::channel(16);
        SupabaseAuth {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: RwLock::new(None),
            events,
        }
    }

    pub fn from_config(http: Client, config: &AuthConfig) -> Result<Self, ConfigError> {
        let url = config
            .supabase_url
            .as_deref()
            .ok_or(ConfigError::MissingSupabase("SUPABASE_URL"))?;
        let key = config
            .supabase_anon_key
            .as_deref()
            .ok_or(ConfigError::MissingSupabase("SUPABASE_ANON_KEY"))?;
        Ok(Self::new(http, url, key))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn bearer(&self) -> String {
        let token = self
            .current()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());
        format!("Bearer {}", token)
    }

    async fn error_from(response: Response) -> AuthError {
        let status = response.status();
        match response.text().await {
            Ok(body) => parse_error(status, &body),
            Err(e) => AuthError::Http(e),
        }
    }

    async fn token_request(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session(Utc::now().timestamp()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let session = self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        self.set_session(Some(session.clone()));
        let _ = self.events.send(AuthStateChange::TokenRefreshed(session.clone()));
        debug!("session refreshed");
        Ok(session)
    }
}

#[async_trait]
impl AuthService for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.current() else {
            return Ok(None);
        };

        if !session.is_expired(Utc::now().timestamp()) {
            return Ok(Some(session));
        }

        match session.refresh_token.as_deref() {
            Some(token) => self.refresh(token).await.map(Some),
            None => {
                self.set_session(None);
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;

        self.set_session(Some(session.clone()));
        let _ = self.events.send(AuthStateChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.current().is_none() {
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoint("/auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        // An already-invalid token still ends the local session
        if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
            let err = Self::error_from(response).await;
            warn!(error = %err, "sign-out failed");
            return Err(err);
        }

        self.set_session(None);
        let _ = self.events.send(AuthStateChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    async fn fetch_role(&self, user_id: &str) -> Result<Option<String>, AuthError> {
        let response = self
            .http
            .get(self.endpoint("/rest/v1/users"))
            .query(&[("id", format!("eq.{}", user_id)), ("select", "role".to_string())])
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, self.bearer())
            // Single-row response; zero or many rows is an error
            .header(header::ACCEPT, "application/vnd.pgrst.object+json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let row: RoleRow = response.json().await?;
        Ok(row.role)
    }
}
