//! MIME lookup and inline data URLs for stored photos.

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

/// Fallback for unknown extensions. Non-image files get labelled as PNG too.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Infer the MIME type from the file extension, case-insensitively.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// Build `data:<mime>;base64,<payload>` for the full file contents.
pub fn data_url(file_name: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type_for(file_name),
        general_purpose::STANDARD.encode(bytes)
    )
}
