//! HTTP surface: a tRPC-compatible RPC endpoint plus a health check
//!
//! - `GET  /api/rpc/{procedure}?input=<json>` for queries
//! - `POST /api/rpc/{procedure}` with a JSON body for mutations
//! - `GET  /health`

use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Json,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use crate::config::Settings;
use crate::storage::SqliteStore;
use crate::{Error, Result};

pub mod context;
pub mod procedures;
pub mod rpc;

pub use context::Caller;

/// Server state
pub struct AppState {
    store: Option<Arc<Mutex<SqliteStore>>>,
    pub cookie_name: String,
    pub session_secret: String,
    pub owner_open_id: Option<String>,
}

impl AppState {
    pub fn new(store: Option<SqliteStore>, settings: &Settings) -> Self {
        Self {
            store: store.map(|s| Arc::new(Mutex::new(s))),
            cookie_name: settings.cookie_name.clone(),
            session_secret: settings.session_secret.clone(),
            owner_open_id: settings.owner_open_id.clone(),
        }
    }

    /// Lock the store, or fail when the server runs without storage.
    pub async fn store(&self) -> Result<MutexGuard<'_, SqliteStore>> {
        match &self.store {
            Some(store) => Ok(store.lock().await),
            None => Err(Error::StorageUnavailable),
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route(
            "/api/rpc/{procedure}",
            get(rpc::handle_query).post(rpc::handle_mutation),
        );

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(from_fn_with_state(state.clone(), context::resolve_caller))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(settings: Settings) -> anyhow::Result<()> {
    if settings.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; signing sessions with the development secret");
    }

    crate::config::ensure_db_dir(&settings.database)?;
    let store = match SqliteStore::open(&settings.database) {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(
                "Failed to open database {}: {}; serving without storage",
                settings.database.display(),
                e
            );
            None
        }
    };

    let state = Arc::new(AppState::new(store, &settings));
    let app = build_router(state, settings.static_dir.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", crate::ui::Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
