//! Data models for the photo storage service.
//!
//! Photos have no database record: these types are built from the upload
//! directory listing and serialize as camelCase JSON for the UI.

pub mod photo;
