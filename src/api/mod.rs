/// JSON error responses.
pub mod error;
/// Endpoint handlers and wire types.
pub mod routes;
/// Shared handler state.
pub mod state;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::{Config, DeployMode};

use self::{
    routes::{list_handler, stats_handler, upsert_handler, wipe_handler},
    state::AppState,
};

/// The JSON API alone.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/rsvps",
            get(list_handler).post(upsert_handler).delete(wipe_handler),
        )
        .route("/api/rsvps/stats", get(stats_handler))
        .with_state(state)
}

/// The full application: API, static bundle in production, request tracing.
pub fn app(state: Arc<AppState>, config: &Config) -> Router {
    let mut app = router(state);
    if config.mode == DeployMode::Production {
        let index = config.static_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)));
    }
    app.layer(TraceLayer::new_for_http())
}
