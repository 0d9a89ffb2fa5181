//! Defines routes for the upload form, the upload endpoint and stored files.
//!
//! ## Structure
//! - `GET  /`               : upload form page
//! - `POST /upload`         : receive one file under the `file` field
//! - `GET  /uploads/{name}` : stored file bytes, straight from the storage directory
//! - `GET  /healthz`, `GET /readyz`: probes
//!
//! `/uploads` is a `ServeDir` mount, so content type, conditional requests
//! and ranges are whatever tower-http provides. It has no view of the upload
//! handler beyond sharing the directory.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{index_page, upload_file},
    },
    services::storage_service::StorageService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the router for every route the server exposes.
///
/// The router carries shared state (`StorageService`) to the handlers;
/// `storage_dir` must be the same directory that service writes to.
pub fn routes(storage_dir: &Path) -> Router<StorageService> {
    Router::new()
        .route("/", get(index_page))
        // uploads are not size-limited
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest_service("/uploads", ServeDir::new(storage_dir))
        .layer(TraceLayer::new_for_http())
}
