//! Session store holding the backend access token and the user's role.
//!
//! The token and role are always written and cleared together. Both
//! implementations keep the pair as a single value so a reader can never
//! observe a fresh token next to a stale role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tower_sessions::Session;

use crate::models::Role;

/// Key under which the pair lives in the cookie-backed session.
pub const AUTH_SESSION_KEY: &str = "auth";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl AuthSession {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().map(Role::parse)
    }
}

/// Storage for the current session. Every operation is total: failures of the
/// underlying medium are logged and read back as "no session".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of the pair, valid for the duration of the current call.
    async fn load(&self) -> AuthSession;

    async fn set_session(&self, token: String, role: Option<String>);

    async fn clear_session(&self);

    async fn token(&self) -> Option<String> {
        self.load().await.token
    }

    async fn role(&self) -> Option<String> {
        self.load().await.role
    }
}

/// Process-local store, shared by clones.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<AuthSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AuthSession {
                token: Some(token.into()),
                role: None,
            })),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> AuthSession {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn set_session(&self, token: String, role: Option<String>) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = AuthSession {
            token: Some(token),
            role,
        };
    }

    async fn clear_session(&self) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = AuthSession::default();
    }
}

/// Store backed by the browser's cookie-keyed server-side session.
#[derive(Clone)]
pub struct CookieSessionStore {
    session: Session,
}

impl CookieSessionStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn load(&self) -> AuthSession {
        match self.session.get::<AuthSession>(AUTH_SESSION_KEY).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read auth session, treating as signed out");
                AuthSession::default()
            }
        }
    }

    async fn set_session(&self, token: String, role: Option<String>) {
        let value = AuthSession {
            token: Some(token),
            role,
        };
        if let Err(e) = self.session.insert(AUTH_SESSION_KEY, value).await {
            tracing::warn!(error = %e, "Failed to persist auth session");
        }
    }

    async fn clear_session(&self) {
        if let Err(e) = self.session.remove::<AuthSession>(AUTH_SESSION_KEY).await {
            tracing::warn!(error = %e, "Failed to remove auth session");
        }
    }
}
