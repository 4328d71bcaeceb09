//! # Routes
//!
//! The application's views and who may open them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route          Path         Needs sign-in   Signed-in user sent to     │
//! │  ─────          ────         ─────────────   ──────────────────────     │
//! │  Home           /            yes             (stays)                   │
//! │  Inventory      /inventory   yes             (stays)                   │
//! │  Sales          /sales       yes             (stays)                   │
//! │  Login          /login       no              /                         │
//! │  Register       /register    no              /                         │
//! │                                                                         │
//! │  Signed out on a protected route ──────────► /login                    │
//! │  Auth state still loading ─────────────────► Pending (decide later)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use stockroom_store::AuthState;

use crate::error::ApiError;

/// A navigable view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Inventory,
    Sales,
    Login,
    Register,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Inventory => "/inventory",
            Route::Sales => "/sales",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    /// True if the route needs a signed-in user.
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Home | Route::Inventory | Route::Sales)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Render the route.
    Allow,
    /// Go somewhere else instead.
    Redirect(Route),
    /// Auth state not known yet.
    Pending,
}

/// Decides whether `route` may be shown in `state`.
pub fn guard(route: Route, state: &AuthState) -> Guard {
    match state {
        AuthState::Loading => Guard::Pending,
        AuthState::SignedIn(_) => match route {
            Route::Login | Route::Register => Guard::Redirect(Route::Home),
            _ => Guard::Allow,
        },
        AuthState::SignedOut | AuthState::AwaitingConfirmation => {
            if route.is_protected() {
                Guard::Redirect(Route::Login)
            } else {
                Guard::Allow
            }
        }
    }
}

/// Guard for commands: a protected route needs a signed-in user now.
pub fn require(route: Route, state: &AuthState) -> Result<(), ApiError> {
    match guard(route, state) {
        Guard::Allow => Ok(()),
        Guard::Redirect(_) | Guard::Pending if route.is_protected() => {
            Err(ApiError::unauthenticated(route.path()))
        }
        _ => Ok(()),
    }
}
