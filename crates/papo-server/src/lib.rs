pub mod config;
pub mod error;
pub mod routes;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use papo_core::Session;
use papo_db::{Database, MemoryStore, Store};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub session: Session,
}

/// `:memory:` keeps everything in process; anything else is an SQLite file.
pub fn open_store(db_path: &str) -> anyhow::Result<Arc<dyn Store>> {
    if db_path == ":memory:" {
        info!("Using in-memory store, nothing will be persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(Database::open(Path::new(db_path))?))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/participants", post(routes::join).get(routes::list_participants))
        .route("/status", post(routes::heartbeat))
        .route("/messages", post(routes::post_message).get(routes::list_messages))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
