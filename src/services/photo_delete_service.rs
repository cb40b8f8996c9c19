//! src/services/photo_delete_service.rs
//!
//! PhotoDeleteService — enumerates the upload directory for the
//! delete-management UI and removes photos by name. The directory listing and
//! file timestamps are the only state; nothing is cached between calls.

use super::{PhotoError, PhotoResult, ensure_file_name_safe, thumbnail};
use crate::{config::PhotoUploadConfig, models::photo::UploadedFileInfo};
use chrono::{DateTime, Utc};
use std::{
    fs::Metadata,
    io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tokio::fs::{self, File};
use tracing::{debug, error, info};

#[derive(Clone, Debug)]
pub struct PhotoDeleteService {
    upload_path: PathBuf,
}

/// A directory entry that passed the photo filter.
struct PhotoEntry {
    file_name: String,
    path: PathBuf,
    created: SystemTime,
}

impl PhotoDeleteService {
    pub fn new(config: &PhotoUploadConfig) -> Self {
        Self {
            upload_path: config.upload_path.clone(),
        }
    }

    pub fn upload_path(&self) -> &Path {
        &self.upload_path
    }

    /// List photos newest first, each with an inline thumbnail.
    ///
    /// A missing directory yields an empty list. A file that cannot be read
    /// gets an empty thumbnail instead of failing the listing.
    pub async fn get_uploaded_files(&self) -> PhotoResult<Vec<UploadedFileInfo>> {
        let mut entries = self.read_entries().await.inspect_err(|err| {
            error!(
                upload_path = %self.upload_path.display(),
                "error getting uploaded files: {}",
                err
            )
        })?;
        entries.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });

        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let thumbnail_url = self.file_data_url(&entry).await;
            files.push(UploadedFileInfo {
                display_name: entry.file_name.clone(),
                file_name: entry.file_name,
                thumbnail_url,
                upload_date: DateTime::<Utc>::from(entry.created),
            });
        }
        Ok(files)
    }

    /// Names of the stored photos, sorted ascending.
    pub async fn list_file_names(&self) -> PhotoResult<Vec<String>> {
        let entries = self.read_entries().await.inspect_err(|err| {
            error!(
                upload_path = %self.upload_path.display(),
                "error listing file names: {}",
                err
            )
        })?;
        let mut names: Vec<String> = entries.into_iter().map(|e| e.file_name).collect();
        names.sort();
        Ok(names)
    }

    /// Delete the named photos.
    ///
    /// All names are validated before anything is removed. Names that are not
    /// a visible regular file (missing, hidden, directories) are skipped.
    /// The first I/O failure aborts the rest of the batch.
    pub async fn delete_photos(&self, file_names: &[String]) -> PhotoResult<()> {
        for name in file_names {
            ensure_file_name_safe(name)?;
        }

        for name in file_names {
            if super::is_hidden(name) {
                debug!("skipping hidden file {}", name);
                continue;
            }
            let file_path = self.upload_path.join(name);
            match fs::symlink_metadata(&file_path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    debug!("{} is not a regular file, skipping", file_path.display());
                    continue;
                }
                Err(err) if super::is_not_found(&err) => {
                    debug!("file {} already missing", file_path.display());
                    continue;
                }
                Err(err) => {
                    error!(file_name = %name, "error deleting photos: {}", err);
                    return Err(PhotoError::Io(err));
                }
            }
            match fs::remove_file(&file_path).await {
                Ok(()) => info!("deleted file: {}", name),
                Err(err) if super::is_not_found(&err) => {
                    debug!("file {} already missing", file_path.display());
                }
                Err(err) => {
                    error!(file_name = %name, "error deleting photos: {}", err);
                    return Err(PhotoError::Io(err));
                }
            }
        }
        Ok(())
    }

    /// Open a stored photo for streaming out.
    ///
    /// Returns the file, its length, and the inferred MIME type.
    pub async fn open_photo(&self, file_name: &str) -> PhotoResult<(File, u64, &'static str)> {
        ensure_file_name_safe(file_name)?;
        if super::is_hidden(file_name) {
            return Err(PhotoError::NotFound(file_name.to_string()));
        }

        let file_path = self.upload_path.join(file_name);
        let file = File::open(&file_path).await.map_err(|err| {
            if super::is_not_found(&err) {
                PhotoError::NotFound(file_name.to_string())
            } else {
                error!(file_name, "error opening photo: {}", err);
                PhotoError::Io(err)
            }
        })?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(PhotoError::NotFound(file_name.to_string()));
        }

        Ok((file, meta.len(), thumbnail::mime_type_for(file_name)))
    }

    /// Regular, non-hidden files directly inside the upload directory.
    ///
    /// Entries that disappear between enumeration and stat are skipped.
    async fn read_entries(&self) -> io::Result<Vec<PhotoEntry>> {
        if !super::dir_exists(&self.upload_path).await? {
            return Ok(Vec::new());
        }

        let mut dir = fs::read_dir(&self.upload_path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if super::is_hidden(&file_name) {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(err) if super::is_not_found(&err) => continue,
                Err(err) => return Err(err),
            };
            if !meta.is_file() {
                continue;
            }
            entries.push(PhotoEntry {
                file_name,
                path: entry.path(),
                created: creation_time(&meta),
            });
        }
        Ok(entries)
    }

    async fn file_data_url(&self, entry: &PhotoEntry) -> String {
        match fs::read(&entry.path).await {
            Ok(bytes) => thumbnail::data_url(&entry.file_name, &bytes),
            Err(err) => {
                error!(
                    file_path = %entry.path.display(),
                    "error reading file for thumbnail: {}",
                    err
                );
                String::new()
            }
        }
    }
}

/// Birth time where the platform records one, modification time otherwise.
fn creation_time(meta: &Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
