pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod store;
pub mod sync;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::store::NoteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: NoteStore,
    pub allowed_origins: Arc<[HeaderValue]>,
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Build the full Axum application router.
///
/// `store` must already be migrated. Only `allowed_origins` may call the API
/// from a browser; requests without an `Origin` header are always accepted.
pub fn build_app(store: NoteStore, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.clone()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(false);

    let state = AppState {
        store,
        allowed_origins: origins.into(),
    };

    Router::new()
        .route("/health", get(health))
        .merge(routes::notes::router())
        .merge(routes::tags::router())
        .layer(middleware::from_fn_with_state(state.clone(), reject_foreign_origin))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn reject_foreign_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        if !state.allowed_origins.contains(origin) {
            let origin = origin.to_str().unwrap_or("<non-ascii>");
            tracing::warn!("Rejected request from origin {origin}");
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": format!("CORS not allowed: {origin}") })),
            )
                .into_response();
        }
    }
    next.run(request).await
}
