//! # Stockroom CLI Library
//!
//! Commands, state and wiring for the `stockroom` binary. The binary only
//! parses arguments; everything it runs lives here so integration tests can
//! drive the same code.
//!
//! ## Module Organization
//! ```text
//! stockroom_cli/
//! ├── lib.rs          ◄─── You are here (tracing & app wiring)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── store.rs    ◄─── Repositories + sale settings
//! │   ├── inventory.rs◄─── Shared inventory view
//! │   └── session.rs  ◄─── Auth provider + session file
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── inventory.rs◄─── Inventory CRUD
//! │   ├── sale.rs     ◄─── Record sale, reconcile, sales table
//! │   └── auth.rs     ◄─── Register, login, logout
//! ├── routes.rs       ◄─── Protected routes and the auth guard
//! ├── render.rs       ◄─── Terminal tables
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  App::connect(config)           App::demo(signed_in)                    │
//! │  ────────────────────           ────────────────────                    │
//! │  RestStore  (PostgREST)         MemoryStore (seeded rows)               │
//! │  AuthClient (GoTrue)            MemoryAuth  (demo account)              │
//! │  session.json on disk           session held in memory                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod render;
pub mod routes;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use stockroom_core::{Money, NewInventoryItem, DEFAULT_SUPPLIER_ID};
use stockroom_store::{AuthClient, AuthProvider, MemoryAuth, RestStore, StoreConfig};

use error::ApiError;
use state::{InventoryView, SessionState, StoreState};

/// Account created by [`App::demo`].
pub const DEMO_EMAIL: &str = "demo@stockroom.local";
pub const DEMO_PASSWORD: &str = "demo-pass";

/// Everything a command may need.
#[derive(Clone)]
pub struct App {
    pub store: StoreState,
    pub view: InventoryView,
    pub session: SessionState,
}

impl App {
    /// Wires the hosted backend.
    ///
    /// ## Startup Sequence
    /// 1. Check the backend settings (anon key present)
    /// 2. Build the REST store and the auth client
    /// 3. Restore the session file and forward its token
    pub async fn connect(config: &StoreConfig, session_path: Option<PathBuf>) -> Result<Self, ApiError> {
        config.backend.validate_remote()?;

        let rest = Arc::new(RestStore::new(&config.backend)?);
        let auth = Arc::new(AuthClient::new(&config.backend)?);

        let session = SessionState::new(auth, session_path).with_rest_store(rest.clone());
        let state = session.restore().await;
        info!(url = %config.backend.url, mode = %config.sales.mode, ?state, "Connected to backend");

        Ok(App {
            store: StoreState::new(rest, config.sales.clone()),
            view: InventoryView::new(),
            session,
        })
    }

    /// In-memory backend seeded with a few items. With `signed_in` the demo
    /// account is already logged in.
    pub async fn demo(signed_in: bool) -> Result<Self, ApiError> {
        let (store, _) = StoreState::memory();
        for (name, quantity, price, cost) in [
            ("Widget", 10, 500, 310),
            ("Gadget", 4, 1250, 800),
            ("Sprocket", 25, 199, 95),
        ] {
            store
                .inventory()
                .insert(&NewInventoryItem {
                    product_name: name.to_string(),
                    quantity,
                    price: Money::from_cents(price),
                    cost: Money::from_cents(cost),
                    supplier_id: DEFAULT_SUPPLIER_ID,
                })
                .await?;
        }

        let auth = Arc::new(MemoryAuth::new(false));
        let session = SessionState::new(auth.clone(), None);
        session.restore().await;
        if signed_in {
            auth.sign_up(DEMO_EMAIL, DEMO_PASSWORD).await?;
        }
        info!(signed_in, "Using in-memory demo backend");

        Ok(App {
            store,
            view: InventoryView::new(),
            session,
        })
    }
}

/// Initializes the tracing subscriber. Logs go to stderr so tables on
/// stdout stay clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockroom=trace` - Show trace for stockroom crates only
/// - Default: WARN, INFO for stockroom crates
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,stockroom=debug,reqwest=warn"
    } else {
        "warn,stockroom=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_store::AuthState;

    #[tokio::test]
    async fn test_demo_backend() {
        let app = App::demo(true).await.unwrap();
        assert!(matches!(app.session.state(), AuthState::SignedIn(_)));

        let names: Vec<_> = app
            .view
            .refresh(app.store.inventory())
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.product_name)
            .collect();
        assert_eq!(names, vec!["Gadget", "Sprocket", "Widget"]);

        let signed_out = App::demo(false).await.unwrap();
        assert_eq!(signed_out.session.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_connect_requires_anon_key() {
        let err = App::connect(&StoreConfig::default(), None)
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.code, error::ErrorCode::Config);
    }
}
