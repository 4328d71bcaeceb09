//! # Auth Provider
//!
//! Email/password accounts on the hosted backend, and the observable
//! "who is signed in" state the rest of the application watches.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AuthState                                      │
//! │                                                                         │
//! │   Loading ──restore(None)──► SignedOut ◄──────── sign_out() ──┐        │
//! │      │                          │                              │        │
//! │      │ restore(Some)            │ sign_in() ok                 │        │
//! │      ▼                          ▼                              │        │
//! │   SignedIn(user) ◄──────────────┴──── sign_up() with session ──┤        │
//! │                                                                │        │
//! │   sign_up() without session ──► AwaitingConfirmation ──────────┘        │
//! │                                  (not an error)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Endpoints
//! - `POST /auth/v1/signup` `{email, password}`
//! - `POST /auth/v1/token?grant_type=password` `{email, password}`
//! - `POST /auth/v1/token?grant_type=refresh_token` `{refresh_token}`
//! - `POST /auth/v1/logout` (bearer = access token)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use stockroom_core::validation::{validate_email, validate_password};

use crate::config::BackendSettings;
use crate::error::{AuthError, AuthResult};

// =============================================================================
// Types
// =============================================================================

/// An account as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Unix time the access token stops being accepted.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    /// Fills `expires_at` from `expires_in` when the provider left it out.
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self
                .expires_in
                .and_then(|secs| i64::try_from(secs).ok())
                .map(|secs| now.timestamp() + secs);
        }
        self
    }

    /// True once the access token has expired. A session without an expiry
    /// never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now.timestamp() >= at)
    }
}

/// Current authentication status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Session not yet restored.
    Loading,
    SignedOut,
    SignedIn(User),
    /// Account created; the provider wants the email confirmed first.
    AwaitingConfirmation,
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            _ => None,
        }
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Account created and signed in.
    SignedIn(Session),
    /// Account created; confirmation email sent.
    AwaitingConfirmation,
}

/// Email/password auth operations.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session>;

    async fn sign_out(&self) -> AuthResult<()>;

    /// Exchanges a refresh token for a new session and signs it in.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<Session>;

    /// Ends the loading state with a previously persisted session.
    async fn restore(&self, session: Option<Session>);

    /// The session currently held, if any.
    async fn session(&self) -> Option<Session>;

    /// Watches the auth state.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    /// Snapshot of the auth state.
    fn state(&self) -> AuthState {
        let rx = self.subscribe();
        let state = rx.borrow().clone();
        state
    }
}

fn check_credentials(email: &str, password: &str) -> AuthResult<()> {
    validate_email(email)?;
    validate_password(password)?;
    Ok(())
}

// =============================================================================
// Response Interpretation
// =============================================================================

/// Message text the provider uses when the confirmation email is pending.
const CONFIRMATION_HINT: &str = "confirmation email";

/// Reads the human-readable message out of an error body.
///
/// The provider has used several shapes over time:
/// `{msg}`, `{error_description}`, `{message}`, `{error}`.
pub fn error_message(status: u16, text: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            let text = text.trim();
            if text.is_empty() {
                format!("HTTP {status}")
            } else {
                text.to_string()
            }
        })
}

/// Interprets a successful sign-up body.
///
/// A body with an access token is a session; a bare user object means the
/// account waits for email confirmation.
pub fn interpret_sign_up(body: Value) -> AuthResult<SignUpOutcome> {
    if body.get("access_token").and_then(Value::as_str).is_some() {
        let session: Session =
            serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(SignUpOutcome::SignedIn(session.stamped(Utc::now())))
    } else {
        Ok(SignUpOutcome::AwaitingConfirmation)
    }
}

fn decode_session(body: Value) -> AuthResult<Session> {
    let session: Session =
        serde_json::from_value(body).map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(session.stamped(Utc::now()))
}

/// True if a rejected sign-up only means the confirmation mail is delayed.
pub fn is_confirmation_pending(err: &AuthError) -> bool {
    match err {
        AuthError::Rejected { message, .. } => message.contains(CONFIRMATION_HINT),
        _ => false,
    }
}

// =============================================================================
// Auth Client
// =============================================================================

/// HTTPS client for the hosted auth provider.
#[derive(Debug)]
pub struct AuthClient {
    client: Client,
    base: Url,
    anon_key: String,
    session: RwLock<Option<Session>>,
    state: watch::Sender<AuthState>,
}

impl AuthClient {
    pub fn new(settings: &BackendSettings) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let mut base = Url::parse(&settings.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let (state, _) = watch::channel(AuthState::Loading);
        Ok(AuthClient {
            client,
            base,
            anon_key: settings.anon_key.clone(),
            session: RwLock::new(None),
            state,
        })
    }

    /// URL of an auth endpoint, e.g. `signup` or `token?grant_type=password`.
    pub fn endpoint(&self, path: &str) -> AuthResult<Url> {
        Ok(self.base.join(&format!("auth/v1/{}", path))?)
    }

    async fn post(&self, url: Url, bearer: Option<&str>, body: Value) -> AuthResult<Value> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = error_message(status.as_u16(), &text);
            warn!(status = status.as_u16(), %message, "Auth provider rejected request");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| AuthError::Decode(e.to_string()))
    }

    async fn set_session(&self, session: Option<Session>) {
        let state = match &session {
            Some(s) => AuthState::SignedIn(s.user.clone()),
            None => AuthState::SignedOut,
        };
        *self.session.write().await = session;
        self.state.send_replace(state);
    }
}

#[async_trait]
impl AuthProvider for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        check_credentials(email, password)?;
        debug!(%email, "Signing up");

        let url = self.endpoint("signup")?;
        let outcome = match self
            .post(url, None, json!({ "email": email, "password": password }))
            .await
        {
            Ok(body) => interpret_sign_up(body)?,
            Err(err) if is_confirmation_pending(&err) => SignUpOutcome::AwaitingConfirmation,
            Err(err) => return Err(err),
        };

        match &outcome {
            SignUpOutcome::SignedIn(session) => self.set_session(Some(session.clone())).await,
            SignUpOutcome::AwaitingConfirmation => {
                *self.session.write().await = None;
                self.state.send_replace(AuthState::AwaitingConfirmation);
            }
        }
        info!(
            %email,
            confirmed = matches!(outcome, SignUpOutcome::SignedIn(_)),
            "Signed up"
        );
        Ok(outcome)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        check_credentials(email, password)?;
        debug!(%email, "Signing in");

        let url = self.endpoint("token?grant_type=password")?;
        let body = self
            .post(url, None, json!({ "email": email, "password": password }))
            .await?;
        let session = decode_session(body)?;

        self.set_session(Some(session.clone())).await;
        info!(%email, "Signed in");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<Session> {
        debug!("Refreshing session");

        let url = self.endpoint("token?grant_type=refresh_token")?;
        let body = self
            .post(url, None, json!({ "refresh_token": refresh_token }))
            .await?;
        let session = decode_session(body)?;

        self.set_session(Some(session.clone())).await;
        info!(user_id = %session.user.id, "Session refreshed");
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(AuthError::NotSignedIn)?;

        let url = self.endpoint("logout")?;
        let result = self.post(url, Some(&token), Value::Null).await;

        // The local session ends whatever the provider answered.
        self.set_session(None).await;
        result?;
        info!("Signed out");
        Ok(())
    }

    async fn restore(&self, session: Option<Session>) {
        self.set_session(session).await;
    }

    async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

// =============================================================================
// Memory Auth
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

/// In-process auth provider for tests and the demo mode.
#[derive(Debug)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    require_confirmation: bool,
    revoked: AtomicBool,
    session: RwLock<Option<Session>>,
    state: watch::Sender<AuthState>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MemoryAuth {
    /// With `require_confirmation`, sign-ups wait for [`MemoryAuth::confirm`].
    pub fn new(require_confirmation: bool) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        MemoryAuth {
            accounts: Mutex::new(HashMap::new()),
            require_confirmation,
            revoked: AtomicBool::new(false),
            session: RwLock::new(None),
            state,
        }
    }

    /// Marks an account's email as confirmed.
    pub async fn confirm(&self, email: &str) -> bool {
        match self.accounts.lock().await.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Makes the provider refuse the current access token, as it does once
    /// the token has expired.
    pub fn revoke_sessions(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    fn session_for(email: &str, account: &Account) -> Session {
        Session {
            access_token: format!("memory-token-{}", account.id),
            refresh_token: Some(format!("memory-refresh-{}", account.id)),
            expires_in: Some(3600),
            expires_at: None,
            user: User {
                id: account.id.clone(),
                email: Some(email.to_string()),
            },
        }
        .stamped(Utc::now())
    }

    async fn set_session(&self, session: Option<Session>) {
        let state = match &session {
            Some(s) => AuthState::SignedIn(s.user.clone()),
            None => AuthState::SignedOut,
        };
        *self.session.write().await = session;
        self.state.send_replace(state);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        check_credentials(email, password)?;

        let account = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(email) {
                return Err(AuthError::Rejected {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
            let account = Account {
                id: format!("user-{}", accounts.len() + 1),
                password: password.to_string(),
                confirmed: !self.require_confirmation,
            };
            accounts.insert(email.to_string(), account.clone());
            account
        };

        if account.confirmed {
            let session = Self::session_for(email, &account);
            self.set_session(Some(session.clone())).await;
            Ok(SignUpOutcome::SignedIn(session))
        } else {
            *self.session.write().await = None;
            self.state.send_replace(AuthState::AwaitingConfirmation);
            Ok(SignUpOutcome::AwaitingConfirmation)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        check_credentials(email, password)?;

        let account = self
            .accounts
            .lock()
            .await
            .get(email)
            .filter(|a| a.password == password)
            .cloned()
            .ok_or_else(|| AuthError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;
        if !account.confirmed {
            return Err(AuthError::Rejected {
                status: 400,
                message: "Email not confirmed".to_string(),
            });
        }

        let session = Self::session_for(email, &account);
        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        if self.session.read().await.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        self.set_session(None).await;
        if self.revoked.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Rejected {
                status: 401,
                message: "invalid JWT: token is expired".to_string(),
            });
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<Session> {
        let session = self
            .accounts
            .lock()
            .await
            .iter()
            .find(|(_, a)| {
                a.confirmed && refresh_token == format!("memory-refresh-{}", a.id)
            })
            .map(|(email, account)| Self::session_for(email, account))
            .ok_or_else(|| AuthError::Rejected {
                status: 400,
                message: "Invalid Refresh Token: Refresh Token Not Found".to_string(),
            })?;

        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn restore(&self, session: Option<Session>) {
        self.set_session(session).await;
    }

    async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(400, r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(400, r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#),
            "Email not confirmed"
        );
        assert_eq!(error_message(502, ""), "HTTP 502");
        assert_eq!(error_message(502, "upstream down"), "upstream down");
    }

    #[test]
    fn test_interpret_sign_up() {
        let body = json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u1", "email": "a@b.co", "aud": "authenticated" }
        });
        match interpret_sign_up(body).unwrap() {
            SignUpOutcome::SignedIn(session) => {
                assert_eq!(session.access_token, "jwt");
                assert_eq!(session.user.email.as_deref(), Some("a@b.co"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let body = json!({ "id": "u1", "email": "a@b.co", "confirmation_sent_at": "2024-01-01T00:00:00Z" });
        assert_eq!(
            interpret_sign_up(body).unwrap(),
            SignUpOutcome::AwaitingConfirmation
        );
    }

    #[test]
    fn test_confirmation_pending_error() {
        let err = AuthError::Rejected {
            status: 500,
            message: "Error sending confirmation email".to_string(),
        };
        assert!(is_confirmation_pending(&err));
        assert!(!is_confirmation_pending(&AuthError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_client_endpoints() {
        let client = AuthClient::new(&BackendSettings {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            client.endpoint("token?grant_type=password").unwrap().as_str(),
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(client.state(), AuthState::Loading);

        client.restore(None).await;
        assert_eq!(client.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_memory_sign_up_and_in() {
        let auth = MemoryAuth::default();
        let mut rx = auth.subscribe();
        assert!(rx.borrow().is_loading());

        let outcome = auth.sign_up("ann@example.com", "secret1").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().user().and_then(|u| u.email.clone()).as_deref(),
            Some("ann@example.com")
        );

        auth.sign_out().await.unwrap();
        assert_eq!(auth.state(), AuthState::SignedOut);
        assert!(matches!(auth.sign_out().await, Err(AuthError::NotSignedIn)));

        let err = auth.sign_in("ann@example.com", "wrong-pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(auth.sign_in("ann@example.com", "secret1").await.is_ok());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let body = json!({
            "access_token": "jwt",
            "expires_in": 3600,
            "user": { "id": "u1" }
        });
        let session: Session = serde_json::from_value(body).unwrap();
        assert!(!session.is_expired(now));

        let session = session.stamped(now);
        assert_eq!(session.expires_at, Some(now.timestamp() + 3600));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::seconds(3600)));
    }

    #[tokio::test]
    async fn test_memory_refresh() {
        let auth = MemoryAuth::default();
        let session = match auth.sign_up("ann@example.com", "secret1").await.unwrap() {
            SignUpOutcome::SignedIn(session) => session,
            other => panic!("unexpected {other:?}"),
        };
        auth.restore(None).await;

        let token = session.refresh_token.unwrap();
        let refreshed = auth.refresh(&token).await.unwrap();
        assert_eq!(refreshed.user.email.as_deref(), Some("ann@example.com"));
        assert!(matches!(auth.state(), AuthState::SignedIn(_)));

        let err = auth.refresh("stale").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_memory_confirmation_flow() {
        let auth = MemoryAuth::new(true);
        let outcome = auth.sign_up("bob@example.com", "secret1").await.unwrap();
        assert_eq!(outcome, SignUpOutcome::AwaitingConfirmation);
        assert_eq!(auth.state(), AuthState::AwaitingConfirmation);

        assert!(auth.sign_in("bob@example.com", "secret1").await.is_err());
        assert!(auth.confirm("bob@example.com").await);
        assert!(auth.sign_in("bob@example.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_validation_runs_first() {
        let auth = MemoryAuth::default();
        assert!(matches!(
            auth.sign_up("not-an-email", "secret1").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            auth.sign_up("a@b.co", "123").await,
            Err(AuthError::Validation(_))
        ));

        auth.sign_up("a@b.co", "secret1").await.unwrap();
        let err = auth.sign_up("a@b.co", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 422, .. }));
    }
}
