use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::credentials::SessionCredentials;
use crate::error::{SessionError, SessionResult};

/// Durable home of the current session, shared by the login/logout flows and
/// the request gateway.
///
/// Every write replaces the whole record, so readers never observe an access
/// token without its user or vice versa.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> SessionResult<Option<SessionCredentials>>;

    async fn save(&self, credentials: &SessionCredentials) -> SessionResult<()>;

    /// Rotate tokens on the existing session.
    async fn update_tokens(&self, access_token: &str, refresh_token: Option<&str>)
        -> SessionResult<SessionCredentials>;

    /// Remove every session key. Returns `true` when a session was present.
    async fn clear(&self) -> SessionResult<bool>;
}

/// Process-local store.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<RwLock<Option<SessionCredentials>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(credentials: SessionCredentials) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(credentials))),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> SessionResult<Option<SessionCredentials>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, credentials: &SessionCredentials) -> SessionResult<()> {
        *self.inner.write().await = Some(credentials.clone());
        Ok(())
    }

    async fn update_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> SessionResult<SessionCredentials> {
        let mut guard = self.inner.write().await;
        let session = guard.as_mut().ok_or(SessionError::Missing)?;
        session.rotate(access_token, refresh_token);
        Ok(session.clone())
    }

    async fn clear(&self) -> SessionResult<bool> {
        Ok(self.inner.write().await.take().is_some())
    }
}
