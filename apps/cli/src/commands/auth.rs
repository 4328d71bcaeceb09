//! # Auth Commands
//!
//! Registration, sign-in and sign-out, each followed by a session file
//! update.

use serde::Serialize;
use tracing::{debug, info};

use stockroom_store::{AuthError, Session, SignUpOutcome, User};

use crate::error::ApiError;
use crate::routes::{guard, Guard, Route};
use crate::state::SessionState;

/// Shown after a sign-up that needs the email confirmed.
pub const CONFIRMATION_MESSAGE: &str = "Your account has been created. Please check your email \
     (including spam folder) for a confirmation link, then log in.";

/// Result of `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Registration {
    SignedIn { user: User },
    AwaitingConfirmation { message: String },
}

fn refuse_if_signed_in(session: &SessionState, route: Route) -> Result<(), ApiError> {
    let state = session.state();
    if let Guard::Redirect(Route::Home) = guard(route, &state) {
        let who = state
            .user()
            .and_then(|u| u.email.clone())
            .unwrap_or_else(|| "another user".to_string());
        return Err(ApiError::validation(format!(
            "Already signed in as {}. Log out first.",
            who
        )));
    }
    Ok(())
}

/// Creates an account.
pub async fn register(
    session: &SessionState,
    email: &str,
    password: &str,
) -> Result<Registration, ApiError> {
    debug!(%email, "register command");
    refuse_if_signed_in(session, Route::Register)?;

    match session.auth().sign_up(email, password).await? {
        SignUpOutcome::SignedIn(signed_in) => {
            session.persist(Some(&signed_in)).await?;
            Ok(Registration::SignedIn {
                user: signed_in.user,
            })
        }
        SignUpOutcome::AwaitingConfirmation => {
            info!(%email, "Registration awaiting email confirmation");
            Ok(Registration::AwaitingConfirmation {
                message: CONFIRMATION_MESSAGE.to_string(),
            })
        }
    }
}

/// Signs in with email and password.
pub async fn login(
    session: &SessionState,
    email: &str,
    password: &str,
) -> Result<Session, ApiError> {
    debug!(%email, "login command");
    refuse_if_signed_in(session, Route::Login)?;

    let signed_in = session.auth().sign_in(email, password).await?;
    session.persist(Some(&signed_in)).await?;
    Ok(signed_in)
}

/// Signs out and forgets the stored session.
///
/// A provider that no longer knows the session, or refuses its expired
/// token, still gets the local file removed and counts as signed out.
pub async fn logout(session: &SessionState) -> Result<(), ApiError> {
    debug!("logout command");

    let result = session.auth().sign_out().await;
    session.persist(None).await?;
    match result {
        Ok(()) | Err(AuthError::NotSignedIn) => Ok(()),
        Err(AuthError::Rejected { status: 401 | 403, message }) => {
            info!(%message, "Provider refused the stored token; signed out locally");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
