// src/routes/mod.rs
pub mod utterance;

use crate::state::SharedState;
use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utterance::{get_metrics_handler, help_handler, launch_handler, utterance_handler};

pub fn create_router(state: SharedState) -> Router {
    let admin_routes = Router::new()
        .route("/metrics", get(get_metrics_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/utterance", post(utterance_handler))
        .route("/launch", post(launch_handler))
        .route("/help", post(help_handler))
        .nest("/admin", admin_routes)
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn auth_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // API key check. Admin routes stay closed when no key is configured.
    let expected = state.config.admin_api_key.as_deref();
    match (expected, req.headers().get("x-admin-key")) {
        (Some(expected), Some(given)) if given.as_bytes() == expected.as_bytes() => {
            Ok(next.run(req).await)
        }
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
