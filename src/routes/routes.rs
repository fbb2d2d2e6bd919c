//! Defines routes for the file API and the informational endpoints.
//!
//! ## Structure
//! - **File endpoints**
//!   - `POST   /api/v1/files`           — upload (multipart `file` field or raw body)
//!   - `GET    /api/v1/files/{id}`      — download
//!   - `HEAD   /api/v1/files/{id}`      — existence check
//!   - `DELETE /api/v1/files/{id}`      — delete
//!   - `GET    /api/v1/files/{id}/info` — metadata as JSON
//!
//! - **Informational endpoints**
//!   - `GET /health`, `GET /readyz`, `GET /api/v1/instance`, `GET /`

use crate::{
    handlers::{
        file_handlers::{delete_file, get_file, get_file_info, head_file, upload_file},
        health_handlers::{health, instance_info, not_found, readyz, root},
    },
    state::AppState,
};
use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the router for all endpoints.
///
/// Request bodies larger than `max_upload_bytes` are rejected with 413.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        .route("/api/v1/instance", get(instance_info))
        .route("/api/v1/files", post(upload_file))
        .route(
            "/api/v1/files/{id}",
            get(get_file).head(head_file).delete(delete_file),
        )
        .route("/api/v1/files/{id}/info", get(get_file_info))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Attach state and per-request tracing to [`routes`].
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    let instance_id = state.instance.instance_id.clone();
    routes(max_upload_bytes)
        .layer(
            TraceLayer::new_for_http().make_span_with(move |req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    instance = %instance_id,
                    method = %req.method(),
                    path = %req.uri().path(),
                )
            }),
        )
        .with_state(state)
}
