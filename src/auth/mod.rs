//! Auth gate collaborators: who is looking at the page and how to log in.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::Viewer;
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Unauthenticated,
    Authenticated(Viewer),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    #[cfg(test)]
    pub fn is_admin(&self) -> bool {
        matches!(self, AuthState::Authenticated(viewer) if viewer.is_admin)
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

/// A bearer token plus the identity it stands for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub username: String,
    pub is_admin: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

impl Credentials {
    pub fn new(token: impl Into<String>, username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
            is_admin,
        }
    }

    /// Reads `ORDER_DESK_TOKEN`, `ORDER_DESK_USERNAME` and `ORDER_DESK_ADMIN`.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("ORDER_DESK_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())?;
        let username = std::env::var("ORDER_DESK_USERNAME").unwrap_or_else(|_| "me".to_string());
        let is_admin = std::env::var("ORDER_DESK_ADMIN")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Some(Self::new(token, username, is_admin))
    }
}

/// External authentication collaborator. The page never inspects
/// credentials beyond asking for the bearer token to forward.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn state(&self) -> AuthState;

    fn bearer_token(&self) -> Option<String>;

    async fn login(&self) -> Result<AuthState, AuthError>;
}

#[derive(Debug, Clone)]
enum Session {
    Pending,
    Anonymous,
    Active(Credentials),
}

type CredentialSource = Arc<dyn Fn() -> Option<Credentials> + Send + Sync>;

/// In-process session seeded from configuration.
pub struct SessionAuth {
    session: RwLock<Session>,
    login_source: CredentialSource,
}

impl SessionAuth {
    pub fn new(credentials: Option<Credentials>) -> Self {
        let session = match credentials {
            Some(credentials) => Session::Active(credentials),
            None => Session::Anonymous,
        };
        Self {
            session: RwLock::new(session),
            login_source: Arc::new(Credentials::from_env),
        }
    }

    /// A session whose identity is not known yet; see [`SessionAuth::establish`].
    #[cfg(test)]
    pub fn pending() -> Self {
        Self {
            session: RwLock::new(Session::Pending),
            login_source: Arc::new(Credentials::from_env),
        }
    }

    /// Replaces where `login()` looks for credentials.
    #[cfg(test)]
    pub fn with_login_source(
        mut self,
        source: impl Fn() -> Option<Credentials> + Send + Sync + 'static,
    ) -> Self {
        self.login_source = Arc::new(source);
        self
    }

    pub fn establish(&self, credentials: Option<Credentials>) {
        let next = match credentials {
            Some(credentials) => Session::Active(credentials),
            None => Session::Anonymous,
        };
        *self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = next;
    }

    fn current(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AuthProvider for SessionAuth {
    fn state(&self) -> AuthState {
        match self.current() {
            Session::Pending => AuthState::Loading,
            Session::Anonymous => AuthState::Unauthenticated,
            Session::Active(credentials) => AuthState::Authenticated(Viewer::new(
                credentials.username,
                credentials.is_admin,
            )),
        }
    }

    fn bearer_token(&self) -> Option<String> {
        match self.current() {
            Session::Active(credentials) => Some(credentials.token),
            _ => None,
        }
    }

    async fn login(&self) -> Result<AuthState, AuthError> {
        match (self.login_source)() {
            Some(credentials) => {
                info!(username = %credentials.username, admin = credentials.is_admin, "Logged in");
                self.establish(Some(credentials));
                Ok(self.state())
            }
            None => {
                warn!("Login attempted without credentials");
                Err(AuthError::MissingCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_session() {
        let auth = SessionAuth::pending();
        assert!(auth.state().is_loading());
        assert_eq!(auth.bearer_token(), None);

        auth.establish(None);
        assert_eq!(auth.state(), AuthState::Unauthenticated);

        auth.establish(Some(Credentials::new("t0k", "root", true)));
        assert!(auth.state().is_admin());
        assert_eq!(auth.bearer_token().as_deref(), Some("t0k"));
    }

    #[tokio::test]
    async fn test_login_uses_source() {
        let auth = SessionAuth::new(None)
            .with_login_source(|| Some(Credentials::new("abc", "alice", false)));
        let state = auth.login().await.unwrap();
        assert_eq!(state, AuthState::Authenticated(Viewer::new("alice", false)));
    }

    #[tokio::test]
    async fn test_login_without_credentials_fails() {
        let auth = SessionAuth::new(None).with_login_source(|| None);
        assert_eq!(auth.login().await, Err(AuthError::MissingCredentials));
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Credentials::new("secret", "bob", false));
        assert!(!rendered.contains("secret"));
    }
}
