//! Defines routes for the photo storage API.
//!
//! ## Structure
//! - **Photo endpoints**
//!   - `POST   /api/photos`      — upload (multipart form, first file part)
//!   - `GET    /api/photos`      — list with inline thumbnails, newest first
//!   - `DELETE /api/photos`      — delete by name (`{"fileNames": [...]}`)
//!   - `GET    /api/listfiles`   — bare file names
//!
//! - **Stored files**
//!   - `GET    /uploads/{file_name}` — raw bytes of one photo
//!
//! - **Health**
//!   - `GET    /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        photo_handlers::{delete_photos, get_upload, list_files, list_photos, upload_photo},
    },
    state::AppState,
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build the router. The request body limit follows the configured upload cap.
pub fn routes(max_upload_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/api/photos",
            get(list_photos).post(upload_photo).delete(delete_photos),
        )
        .route("/api/listfiles", get(list_files))
        .route("/uploads/{file_name}", get(get_upload))
        .layer(DefaultBodyLimit::max(body_limit))
}
