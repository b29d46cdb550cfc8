//! Granting users access to the protected trading script.
//!
//! Every grant goes through the process-wide [`SessionCache`], so the
//! sign-in happens once per session lifetime no matter how many grants are
//! issued. The call to the external service sits behind [`AccessGrantClient`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::session::{session_cache, AccessSession, SessionCache, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum AccessGrantError {
    #[error("username is required")]
    MissingUsername,
    #[error("Access grants are not configured")]
    NotConfigured,
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The service answered with a non-success status.
    #[error("Access grant rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Access grant request failed: {0}")]
    Transport(String),
}

impl AccessGrantError {
    /// The service no longer accepts the session's cookies.
    fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

/// Issues a single grant against the external service.
#[async_trait]
pub trait AccessGrantClient: Send + Sync {
    async fn grant(&self, session: &AccessSession, username: &str) -> Result<(), AccessGrantError>;
}

pub struct AccessGranter {
    client: Arc<dyn AccessGrantClient>,
}

impl AccessGranter {
    pub fn new(client: Arc<dyn AccessGrantClient>) -> Self {
        Self { client }
    }

    /// Grant `username` access using the process-wide session cache.
    pub async fn grant(&self, username: &str) -> Result<(), AccessGrantError> {
        self.grant_with(session_cache()?, username).await
    }

    /// Grant `username` access using `cache`.
    ///
    /// A 401 or 403 means the cached session went stale before its TTL; the
    /// cache signs in again and the grant is retried once.
    pub async fn grant_with(&self, cache: &SessionCache, username: &str) -> Result<(), AccessGrantError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AccessGrantError::MissingUsername);
        }

        let session = cache.get_or_login().await?;
        match self.client.grant(&session, username).await {
            Err(err) if err.is_auth_rejection() => {
                warn!(error = %err, "access-grant session rejected, signing in again");
                let session = cache.refresh().await?;
                self.client.grant(&session, username).await?;
            }
            other => other?,
        }

        info!(username, "granted script access");
        Ok(())
    }
}
