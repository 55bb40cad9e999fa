use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, redeem_handler};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Self::routes(state)
            .layer(cors())
            .layer(TraceLayer::new_for_http())
    }

    /// Same API, with files under `static_dir` served for any other path.
    pub fn router_with_static(state: AppState, static_dir: impl AsRef<Path>) -> Router {
        Self::routes(state)
            .fallback_service(ServeDir::new(static_dir.as_ref()))
            .layer(cors())
            .layer(TraceLayer::new_for_http())
    }

    fn routes(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/redeem", post(redeem_handler))
            .with_state(state)
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
