use crate::api::{AppState, get_config, health, put_config};
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/config", get(get_config).put(put_config))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}
