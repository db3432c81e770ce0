use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_link_handler, health_handler, redirect_handler, root_handler, stats_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/shorten", post(create_link_handler))
            .route("/shorten/", post(create_link_handler))
            .route("/stats/{short_code}", get(stats_handler))
            .route("/{short_code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}
