//! Photo storage services. The upload directory is the only state: file names
//! are the keys and filesystem metadata supplies the timestamps.

pub mod photo_delete_service;
pub mod photo_upload_service;
pub mod thumbnail;

use std::{io, path::Path};
use thiserror::Error;

pub use photo_delete_service::PhotoDeleteService;
pub use photo_upload_service::PhotoUploadService;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo `{0}` not found")]
    NotFound(String),
    #[error("invalid file name `{0}`")]
    InvalidFileName(String),
    #[error("request did not contain a file")]
    MissingFile,
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type PhotoResult<T> = Result<T, PhotoError>;

/// Reject names that could resolve outside the upload directory.
///
/// A valid name is a single path component: not empty, not `.` or `..`,
/// no `/`, `\` or NUL.
pub fn ensure_file_name_safe(name: &str) -> PhotoResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(PhotoError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Dotfiles are in-flight uploads or readiness scratch files, never photos.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// True when `err` means the path simply is not there.
pub(crate) fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Directory existence check used by the read paths.
pub(crate) async fn dir_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(err) if is_not_found(&err) => Ok(false),
        Err(err) => Err(err),
    }
}
