mod extract;
mod posts;

pub use extract::{RequestInput, BODY_NOT_OBJECT_MESSAGE};

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::controller::PostController;
use crate::store::PostStore;

/// Full application router for a given store
pub fn router<S: PostStore>(controller: PostController<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", posts::routes::<S>())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(controller))
}

async fn health_check() -> &'static str {
    "OK"
}
