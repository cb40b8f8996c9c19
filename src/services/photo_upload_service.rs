//! src/services/photo_upload_service.rs
//!
//! PhotoUploadService — streams an uploaded photo into the upload directory
//! under a random name that keeps the original extension.

use super::{PhotoError, PhotoResult};
use crate::{config::PhotoUploadConfig, models::photo::StoredPhoto};
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PhotoUploadService {
    upload_path: PathBuf,
    max_upload_bytes: u64,
}

impl PhotoUploadService {
    pub fn new(config: &PhotoUploadConfig) -> Self {
        Self {
            upload_path: config.upload_path.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// `<uuid-v4><extension>`, extension taken from the original name with
    /// its case preserved.
    fn generate_file_name(original_name: &str) -> String {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        format!("{}{}", Uuid::new_v4(), extension)
    }

    /// Stream-upload a photo.
    ///
    /// - Creates the upload directory if missing.
    /// - Writes into a hidden temporary file, enforcing the byte cap.
    /// - Renames to the generated name once the stream is complete.
    ///
    /// The temporary file is removed on every error path, so a failed or
    /// oversized upload leaves nothing behind.
    pub async fn upload_photo_stream<S>(
        &self,
        original_name: &str,
        stream: S,
    ) -> PhotoResult<StoredPhoto>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let result = self.write_photo(original_name, stream).await;
        if let Err(err) = &result {
            error!(
                upload_path = %self.upload_path.display(),
                original_name,
                "error uploading photo: {}",
                err
            );
        }
        result
    }

    async fn write_photo<S>(&self, original_name: &str, stream: S) -> PhotoResult<StoredPhoto>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        if !super::dir_exists(&self.upload_path).await? {
            fs::create_dir_all(&self.upload_path).await?;
            info!("created upload directory {}", self.upload_path.display());
        }

        let file_name = Self::generate_file_name(original_name);
        let file_path = self.upload_path.join(&file_name);
        let tmp_path = self
            .upload_path
            .join(format!(".upload-{}.part", Uuid::new_v4()));

        match self.copy_capped(&tmp_path, stream).await {
            Ok(size_bytes) => {
                if let Err(err) = fs::rename(&tmp_path, &file_path).await {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(PhotoError::Io(err));
                }
                debug!("stored {} ({} bytes)", file_path.display(), size_bytes);
                Ok(StoredPhoto {
                    file_name,
                    size_bytes,
                })
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                    if !super::is_not_found(&cleanup) {
                        debug!(
                            "could not remove partial upload {}: {}",
                            tmp_path.display(),
                            cleanup
                        );
                    }
                }
                Err(err)
            }
        }
    }

    async fn copy_capped<S>(&self, tmp_path: &Path, stream: S) -> PhotoResult<u64>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let mut file = File::create(tmp_path).await?;
        let mut size_bytes: u64 = 0;

        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size_bytes += chunk.len() as u64;
            if size_bytes > self.max_upload_bytes {
                return Err(PhotoError::TooLarge {
                    limit: self.max_upload_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(size_bytes)
    }
}
