//! Shared state handed to every handler.

use crate::{
    config::PhotoUploadConfig,
    services::{PhotoDeleteService, PhotoUploadService},
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Identity database, only checked by readiness here.
    pub db: Arc<SqlitePool>,
    pub uploads: PhotoUploadService,
    pub photos: PhotoDeleteService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, config: &PhotoUploadConfig) -> Self {
        Self {
            db,
            uploads: PhotoUploadService::new(config),
            photos: PhotoDeleteService::new(config),
        }
    }
}
