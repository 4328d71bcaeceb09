//! # Session State
//!
//! The auth provider plus the file that carries a signed-in session from
//! one `stockroom` invocation to the next. When talking to the hosted
//! backend, the session's access token is handed to the REST store so
//! row-level security sees the user.
//!
//! An expired session is exchanged for a fresh one with its refresh token
//! on restore. If that fails, the user is signed out and the file removed.
//!
//! ## Platform-Specific Paths
//! - **Linux**: `~/.local/share/stockroom/session.json`
//! - **macOS**: `~/Library/Application Support/com.stockroom.stockroom/session.json`
//! - **Windows**: `%APPDATA%\stockroom\stockroom\data\session.json`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use directories::ProjectDirs;
use tracing::{debug, info, warn};

use stockroom_store::{AuthError, AuthProvider, AuthState, RestStore, Session};

use crate::error::{ApiError, ErrorCode};

/// Auth provider and persisted session.
#[derive(Clone)]
pub struct SessionState {
    auth: Arc<dyn AuthProvider>,
    path: Option<PathBuf>,
    rest: Option<Arc<RestStore>>,
}

impl SessionState {
    /// `path = None` keeps the session in memory only.
    pub fn new(auth: Arc<dyn AuthProvider>, path: Option<PathBuf>) -> Self {
        SessionState {
            auth,
            path,
            rest: None,
        }
    }

    /// Forwards session tokens to `store`.
    pub fn with_rest_store(mut self, store: Arc<RestStore>) -> Self {
        self.rest = Some(store);
        self
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Current auth state.
    pub fn state(&self) -> AuthState {
        self.auth.state()
    }

    /// Reads the session file and ends the provider's loading state.
    ///
    /// An unreadable file is treated as signed out. An expired session is
    /// refreshed first.
    pub async fn restore(&self) -> AuthState {
        let stored = match &self.path {
            Some(path) => match read_session(path) {
                Ok(session) => session,
                Err(e) => {
                    warn!(?path, error = %e, "Ignoring unreadable session file");
                    None
                }
            },
            None => None,
        };
        let session = match stored {
            Some(session) if session.is_expired(Utc::now()) => self.renew(session).await,
            other => other,
        };

        debug!(signed_in = session.is_some(), "Restoring session");
        self.forward_token(session.as_ref()).await;
        self.auth.restore(session).await;
        self.auth.state()
    }

    /// Records a sign-in or sign-out: token forwarding and the session file.
    pub async fn persist(&self, session: Option<&Session>) -> Result<(), ApiError> {
        self.forward_token(session).await;

        let Some(path) = &self.path else {
            return Ok(());
        };

        let result = match session {
            Some(session) => write_session(path, session),
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };

        result.map_err(|e| {
            ApiError::new(
                ErrorCode::Config,
                format!("Failed to write session file {}: {}", path.display(), e),
            )
        })?;
        info!(?path, signed_in = session.is_some(), "Session file updated");
        Ok(())
    }

    /// Trades an expired session for a new one, keeping the file in step.
    async fn renew(&self, expired: Session) -> Option<Session> {
        let renewed = match expired.refresh_token.as_deref() {
            Some(token) => self.auth.refresh(token).await,
            None => Err(AuthError::NotSignedIn),
        };

        let session = match renewed {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(user_id = %expired.user.id, error = %e, "Session expired; signing out");
                None
            }
        };
        if let Err(e) = self.persist(session.as_ref()).await {
            warn!(error = %e, "Could not update session file");
        }
        session
    }

    async fn forward_token(&self, session: Option<&Session>) {
        if let Some(rest) = &self.rest {
            rest.set_access_token(session.map(|s| s.access_token.clone()))
                .await;
        }
    }

    /// Default session file location.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.data_dir().join("session.json"))
    }
}

fn read_session(path: &Path) -> std::io::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn write_session(path: &Path, session: &Session) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(session)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_store::{MemoryAuth, SignUpOutcome, User};

    fn session() -> Session {
        Session {
            access_token: "jwt".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            expires_at: None,
            user: User {
                id: "u1".to_string(),
                email: Some("ann@example.com".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_persist_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("session.json");

        let state = SessionState::new(Arc::new(MemoryAuth::default()), Some(path.clone()));
        assert!(state.state().is_loading());
        assert_eq!(state.restore().await, AuthState::SignedOut);

        state.persist(Some(&session())).await.unwrap();
        let fresh = SessionState::new(Arc::new(MemoryAuth::default()), Some(path.clone()));
        assert_eq!(fresh.restore().await, AuthState::SignedIn(session().user));

        fresh.persist(None).await.unwrap();
        assert!(!path.exists());
        fresh.persist(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let auth = Arc::new(MemoryAuth::default());
        let signed_up = match auth.sign_up("ann@example.com", "secret1").await.unwrap() {
            SignUpOutcome::SignedIn(session) => session,
            other => panic!("unexpected {other:?}"),
        };
        let expired = Session {
            expires_at: Some(Utc::now().timestamp() - 60),
            ..signed_up
        };
        write_session(&path, &expired).unwrap();

        let state = SessionState::new(auth, Some(path.clone()));
        assert!(matches!(state.restore().await, AuthState::SignedIn(_)));
        let saved = read_session(&path).unwrap().unwrap();
        assert!(!saved.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_signs_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let expired = Session {
            expires_at: Some(Utc::now().timestamp() - 60),
            ..session()
        };
        write_session(&path, &expired).unwrap();

        let state = SessionState::new(Arc::new(MemoryAuth::default()), Some(path.clone()));
        assert_eq!(state.restore().await, AuthState::SignedOut);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let state = SessionState::new(Arc::new(MemoryAuth::default()), Some(path));
        assert_eq!(state.restore().await, AuthState::SignedOut);
    }
}
