//! Represents a photo stored in the upload directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo as shown by the delete-management listing.
///
/// Built from filesystem metadata on every listing; there is no stored record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileInfo {
    /// Generated file name (`<uuid><extension>`), also the delete key.
    pub file_name: String,

    /// Name shown in the UI. Same as `file_name`, there is no separate metadata.
    pub display_name: String,

    /// Inline `data:<mime>;base64,...` URL, empty if the file could not be read.
    pub thumbnail_url: String,

    /// File creation time.
    pub upload_date: DateTime<Utc>,
}

/// Receipt returned once an upload has been written to disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhoto {
    pub file_name: String,
    pub size_bytes: u64,
}
