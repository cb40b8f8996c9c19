//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks DB connectivity and the upload volume

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Liveness check. Always 200 OK, never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// 200 when the identity database answers and the upload volume accepts a
/// write/read/delete round trip, 503 otherwise. The scratch file is dot-prefixed
/// so photo listings never show it.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = HashMap::new();
    checks.insert("sqlite", CheckStatus::from(check_database(&state).await));
    checks.insert("uploads", CheckStatus::from(check_upload_volume(&state).await));

    let ready = checks.values().all(|c| c.ok);
    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };
    (
        status,
        Json(ReadyResponse {
            status: label.into(),
            checks,
        }),
    )
}

async fn check_database(state: &AppState) -> Result<(), String> {
    let one: i64 = sqlx::query_scalar("SELECT 1")
        .fetch_one(&*state.db)
        .await
        .map_err(|e| format!("error: {}", e))?;
    if one != 1 {
        return Err(format!("unexpected result: {}", one));
    }
    Ok(())
}

async fn check_upload_volume(state: &AppState) -> Result<(), String> {
    let dir = state.photos.upload_path();
    fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("could not create upload dir: {}", e))?;

    let scratch = dir.join(format!(".readyz-{}", Uuid::new_v4()));
    fs::write(&scratch, b"readyz")
        .await
        .map_err(|e| format!("could not write to upload dir: {}", e))?;
    let read_back = fs::read(&scratch).await;
    let removed = fs::remove_file(&scratch).await;

    match read_back {
        Ok(bytes) if bytes == b"readyz" => {}
        Ok(_) => return Err("upload dir returned different bytes".into()),
        Err(e) => return Err(format!("could not read from upload dir: {}", e)),
    }
    removed.map_err(|e| format!("could not delete from upload dir: {}", e))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl From<Result<(), String>> for CheckStatus {
    fn from(result: Result<(), String>) -> Self {
        Self {
            ok: result.is_ok(),
            error: result.err(),
        }
    }
}
