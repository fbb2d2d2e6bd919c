//! Health, readiness and informational handlers.
//!
//! - GET /health           -> liveness with instance identity and uptime
//! - GET /readyz           -> readiness that checks the storage directories
//! - GET /api/v1/instance  -> instance description
//! - GET /                 -> service banner with the endpoint directory

use crate::{errors::AppError, state::AppState};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SERVICE_NAME: &str = "storage-node";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `GET /health`
///
/// Liveness probe. Never touches the disk.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: SERVICE_NAME,
            instance_id: state.instance.instance_id.clone(),
            uptime: state.instance.uptime(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }),
    )
}

/// `GET /readyz`
///
/// Writes, reads back and removes a marker file in the storage and metadata
/// directories. HTTP 200 when that works, HTTP 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let disk = match state.storage.check_writable().await {
        Ok(()) => CheckStatus {
            ok: true,
            error: None,
        },
        Err(e) => {
            tracing::warn!("readiness disk check failed: {}", e);
            CheckStatus {
                ok: false,
                error: Some(e.to_string()),
            }
        }
    };

    let overall_ok = disk.ok;
    let mut checks = BTreeMap::new();
    checks.insert("disk", disk);

    let body = ReadyResponse {
        status: if overall_ok { "ok" } else { "error" },
        checks,
    };
    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// `GET /api/v1/instance`
pub async fn instance_info(State(state): State<AppState>) -> impl IntoResponse {
    let instance = &state.instance;
    Json(InstanceResponse {
        instance_id: instance.instance_id.clone(),
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        uptime: instance.uptime(),
        started_at: instance
            .started_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        endpoints: BTreeMap::from([
            ("files", "/api/v1/files"),
            ("health", "/health"),
            ("instance", "/api/v1/instance"),
        ]),
    })
}

/// `GET /`
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(RootResponse {
        service: "Single-node file storage",
        version: SERVICE_VERSION,
        instance_id: state.instance.instance_id.clone(),
        endpoints: BTreeMap::from([
            ("upload", "POST /api/v1/files"),
            ("download", "GET /api/v1/files/{id}"),
            ("info", "GET /api/v1/files/{id}/info"),
            ("delete", "DELETE /api/v1/files/{id}"),
            ("exists", "HEAD /api/v1/files/{id}"),
            ("health", "GET /health"),
            ("ready", "GET /readyz"),
            ("instance", "GET /api/v1/instance"),
        ]),
    })
}

/// Fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::not_found("Resource not found")
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    instance_id: String,
    uptime: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

#[derive(Serialize)]
struct InstanceResponse {
    instance_id: String,
    service: &'static str,
    version: &'static str,
    uptime: String,
    started_at: String,
    endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
struct RootResponse {
    service: &'static str,
    version: &'static str,
    instance_id: String,
    endpoints: BTreeMap<&'static str, &'static str>,
}
