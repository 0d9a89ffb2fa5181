//! Liveness and readiness for the upload server.
//!
//! - GET /healthz  -> process is up; touches nothing
//! - GET /readyz   -> the storage directory uploads go to is usable

use crate::services::storage_service::StorageService;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

/// `GET /healthz`
pub async fn healthz() -> Json<ProbeReport> {
    Json(ProbeReport {
        status: "ok",
        storage: None,
    })
}

/// `GET /readyz`
///
/// Only `metadata` is read, so probes never leave files next to uploads.
/// 503 when the directory is gone or is not a directory.
pub async fn readyz(State(service): State<StorageService>) -> (StatusCode, Json<ProbeReport>) {
    let result = service.check_storage_dir().await;
    let storage = StorageCheck {
        dir: service.base_path.display().to_string(),
        ok: result.is_ok(),
        error: result.err().map(|e| e.to_string()),
    };

    let (status, label) = if storage.ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };
    (
        status,
        Json(ProbeReport {
            status: label,
            storage: Some(storage),
        }),
    )
}

#[derive(Serialize)]
pub struct ProbeReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageCheck>,
}

#[derive(Serialize)]
pub struct StorageCheck {
    dir: String,
    ok: bool,
    error: Option<String>,
}
