//! Cached sign-in session for the third-party access-grant service.
//!
//! Granting a student access to the partner platform needs a logged-in
//! session (cookies plus a CSRF token). Logging in is slow and rate limited,
//! so one session is shared by the whole process and reused until it expires.
//!
//! The cache is explicit state: it is created once with
//! [`init_session_cache`], every caller goes through [`SessionCache::get_or_login`],
//! and expiry is checked before each reuse. The async mutex is held across the
//! login so concurrent callers wait for a single sign-in instead of racing.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Sign-in failed: {0}")]
    SignIn(String),
    #[error("No CSRF token in sign-in response")]
    MissingCsrfToken,
    #[error("Session cache not initialized")]
    NotInitialized,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSession {
    /// Raw `Set-Cookie` value returned by the sign-in call
    pub cookies: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Performs the actual sign-in against the external service.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// Sign in and return the `Set-Cookie` header of the response.
    async fn sign_in(&self) -> Result<String, SessionError>;
}

/// Pull the `csrf_token=<value>` cookie out of a `Set-Cookie` header.
pub fn extract_csrf_token(set_cookie: &str) -> Result<String, SessionError> {
    set_cookie
        .split([';', ','])
        .filter_map(|part| part.trim().strip_prefix("csrf_token="))
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(SessionError::MissingCsrfToken)
}

pub struct SessionCache {
    authenticator: Arc<dyn SessionAuthenticator>,
    ttl: Duration,
    session: Mutex<Option<AccessSession>>,
}

impl SessionCache {
    pub fn new(authenticator: Arc<dyn SessionAuthenticator>, ttl: Duration) -> Self {
        Self {
            authenticator,
            ttl,
            session: Mutex::new(None),
        }
    }

    pub async fn get_or_login(&self) -> Result<AccessSession, SessionError> {
        self.get_or_login_at(Utc::now()).await
    }

    /// Reuse the cached session if it is still valid at `now`, otherwise sign in.
    pub async fn get_or_login_at(&self, now: DateTime<Utc>) -> Result<AccessSession, SessionError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref().filter(|s| s.is_valid_at(now)) {
            debug!(expires_at = %session.expires_at, "reusing cached session");
            return Ok(session.clone());
        }

        let session = self.sign_in(now).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Sign in again even if the cached session has not expired.
    pub async fn refresh(&self) -> Result<AccessSession, SessionError> {
        let mut guard = self.session.lock().await;
        let session = self.sign_in(Utc::now()).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    pub async fn invalidate(&self) {
        self.session.lock().await.take();
    }

    /// The cached session, expired or not.
    pub async fn current(&self) -> Option<AccessSession> {
        self.session.lock().await.clone()
    }

    async fn sign_in(&self, now: DateTime<Utc>) -> Result<AccessSession, SessionError> {
        let cookies = self.authenticator.sign_in().await?;
        let csrf_token = extract_csrf_token(&cookies)?;
        let expires_at = now + self.ttl;
        info!(%expires_at, "signed in to access-grant service");
        Ok(AccessSession {
            cookies,
            csrf_token,
            expires_at,
        })
    }
}

static SESSION_CACHE: OnceLock<SessionCache> = OnceLock::new();

/// Install the process-wide session cache. Later calls are no-ops.
pub fn init_session_cache(authenticator: Arc<dyn SessionAuthenticator>, ttl: Duration) -> &'static SessionCache {
    SESSION_CACHE.get_or_init(|| SessionCache::new(authenticator, ttl))
}

pub fn session_cache() -> Result<&'static SessionCache, SessionError> {
    SESSION_CACHE.get().ok_or(SessionError::NotInitialized)
}
