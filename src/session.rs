//! Browser sessions.
//!
//! Request handlers never look sessions up through global state. They receive
//! an [`SessionAccessor`] capability, which the server wires to a
//! [`SessionStore`] and tests replace with a fake.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::http::{HeaderMap, header::COOKIE};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    auth::pkce,
    error::AuthError,
    types::{PendingLogin, Session, Token},
};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "cookbook_session";

/// Pending logins older than this are dropped.
const PENDING_LOGIN_TTL_SECS: u64 = 600;

#[async_trait]
pub trait SessionAccessor: Send + Sync {
    /// Session bound to the request, if any.
    async fn session(&self, headers: &HeaderMap) -> Option<Session>;

    /// Access token of `session`, scoped to `audience` when one is given.
    async fn access_token(
        &self,
        session: &Session,
        audience: Option<&str>,
    ) -> Result<String, AuthError>;
}

/// In-memory session store keyed by the session cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    pending: Arc<RwLock<HashMap<String, PendingLogin>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session for `token` and returns its id. Sessions whose
    /// token has expired are dropped on the way.
    pub async fn create(&self, token: Token) -> String {
        let id = pkce::random_token(32);
        let session = Session {
            id: id.clone(),
            token,
        };
        let now = Utc::now().timestamp() as u64;
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.token.expires_within(now, 0));
        sessions.insert(id.clone(), session);
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Any one session; used by `login` to pick up the session its own
    /// callback just created.
    pub async fn first(&self) -> Option<Session> {
        self.sessions.read().await.values().next().cloned()
    }

    pub async fn start_login(&self, state: &str, code_verifier: String) {
        let now = Utc::now().timestamp() as u64;
        let mut pending = self.pending.write().await;
        pending.retain(|_, p| now.saturating_sub(p.created_at) < PENDING_LOGIN_TTL_SECS);
        pending.insert(
            state.to_string(),
            PendingLogin {
                code_verifier,
                created_at: now,
            },
        );
    }

    /// Removes and returns the pending login for `state`. Each state is
    /// single-use.
    pub async fn finish_login(&self, state: &str) -> Option<PendingLogin> {
        let now = Utc::now().timestamp() as u64;
        self.pending
            .write()
            .await
            .remove(state)
            .filter(|p| now.saturating_sub(p.created_at) < PENDING_LOGIN_TTL_SECS)
    }
}

#[async_trait]
impl SessionAccessor for SessionStore {
    /// Sessions are never refreshed here, so one whose token has expired is
    /// removed and treated as absent.
    async fn session(&self, headers: &HeaderMap) -> Option<Session> {
        let id = session_id(headers)?;
        let session = self.get(&id).await?;

        let now = Utc::now().timestamp() as u64;
        if session.token.expires_within(now, 0) {
            self.remove(&id).await;
            return None;
        }
        Some(session)
    }

    async fn access_token(
        &self,
        session: &Session,
        audience: Option<&str>,
    ) -> Result<String, AuthError> {
        let session = self.get(&session.id).await.ok_or(AuthError::NoSession)?;
        let token = &session.token;
        if let Some(audience) = audience {
            if token.audience.as_deref() != Some(audience) {
                return Err(AuthError::AudienceUnavailable(audience.to_string()));
            }
        }

        let now = Utc::now().timestamp() as u64;
        if token.access_token.is_empty() || token.expires_within(now, 0) {
            return Err(AuthError::TokenExpired);
        }

        Ok(token.access_token.clone())
    }
}

/// Session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value binding the browser to session `id`.
pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// `Set-Cookie` value that expires the session cookie.
pub fn expired_session_cookie() -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    )
}
