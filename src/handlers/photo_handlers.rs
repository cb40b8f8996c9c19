//! HTTP handlers for photo upload, listing, serving and deletion.
//! Upload bodies are streamed straight to disk; the services own all
//! filesystem access.

use crate::{
    errors::AppError,
    models::photo::{StoredPhoto, UploadedFileInfo},
    services::PhotoError,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::io;
use tokio_util::io::ReaderStream;

/// Body of `DELETE /api/photos`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePhotosReq {
    pub file_names: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoResp {
    pub success: bool,
    #[serde(flatten)]
    pub photo: StoredPhoto,
}

/// POST `/api/photos` — store the first file part of a multipart form.
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart.next_field().await? {
        // Browsers send `filename=""` when no file was selected.
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let stream = field.map(|chunk| chunk.map_err(io::Error::other));
        let photo = state
            .uploads
            .upload_photo_stream(&original_name, stream)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadPhotoResp {
                success: true,
                photo,
            }),
        ));
    }

    Err(PhotoError::MissingFile.into())
}

/// GET `/api/photos` — newest first, with inline thumbnails.
pub async fn list_photos(
    State(state): State<AppState>,
) -> Result<Json<Vec<UploadedFileInfo>>, AppError> {
    Ok(Json(state.photos.get_uploaded_files().await?))
}

/// DELETE `/api/photos` — remove the named photos, skipping missing ones.
pub async fn delete_photos(
    State(state): State<AppState>,
    Json(req): Json<DeletePhotosReq>,
) -> Result<StatusCode, AppError> {
    state.photos.delete_photos(&req.file_names).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/listfiles` — bare file names.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.photos.list_file_names().await?))
}

/// GET `/uploads/{file_name}` — stream the stored bytes.
pub async fn get_upload(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let (file, len, mime) = state.photos.open_photo(&file_name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PhotoUploadConfig, db::tests::memory_pool};
    use axum::{
        body::to_bytes,
        extract::{FromRequest, Request},
    };
    use serde_json::Value;
    use tempfile::TempDir;

    const BOUNDARY: &str = "photo-volume-boundary";

    async fn state(dir: &std::path::Path, cap: u64) -> AppState {
        let config = PhotoUploadConfig {
            upload_path: dir.to_path_buf(),
            max_upload_bytes: cap,
        };
        AppState::new(memory_pool().await, &config)
    }

    async fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match filename {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, f
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/photos")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_then_list_then_delete() {
        let tmp = TempDir::new().unwrap();
        let state = state(tmp.path(), 1024).await;

        let form = multipart(&[
            ("caption", None, b"ignored"),
            ("photo", Some("a.png"), b"0123456789"),
        ])
        .await;
        let response = upload_photo(State(state.clone()), form)
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let uploaded = json_body(response).await;
        assert_eq!(uploaded["success"], true);
        assert_eq!(uploaded["sizeBytes"], 10);
        let file_name = uploaded["fileName"].as_str().unwrap().to_string();
        assert!(file_name.ends_with(".png"));

        let Json(listed) = list_photos(State(state.clone())).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].file_name, file_name);
        assert_eq!(
            listed[0].thumbnail_url,
            "data:image/png;base64,MDEyMzQ1Njc4OQ=="
        );

        let Json(names) = list_files(State(state.clone())).await.unwrap();
        assert_eq!(names, vec![file_name.clone()]);

        let status = delete_photos(
            State(state.clone()),
            Json(DeletePhotosReq {
                file_names: vec![file_name],
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(listed) = list_photos(State(state)).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn upload_without_file_part_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let state = state(tmp.path(), 1024).await;

        let form = multipart(&[("caption", None, b"no file here")]).await;
        let err = upload_photo(State(state), form).await.err().unwrap();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_file_selection_is_bad_request_and_not_stored() {
        let tmp = TempDir::new().unwrap();
        let state = state(tmp.path(), 1024).await;

        let form = multipart(&[("photo", Some(""), b"")]).await;
        let err = upload_photo(State(state.clone()), form).await.err().unwrap();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let Json(names) = list_files(State(state)).await.unwrap();
        assert!(names.is_empty());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_not_stored() {
        let tmp = TempDir::new().unwrap();
        let state = state(tmp.path(), 8).await;

        let form = multipart(&[("photo", Some("big.jpg"), b"0123456789")]).await;
        let err = upload_photo(State(state.clone()), form).await.err().unwrap();

        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        let Json(names) = list_files(State(state)).await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn listings_on_missing_directory_are_empty() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp.path().join("not-yet"), 1024).await;

        let Json(listed) = list_photos(State(state.clone())).await.unwrap();
        let Json(names) = list_files(State(state)).await.unwrap();
        assert!(listed.is_empty());
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let state = state(tmp.path(), 1024).await;

        let err = delete_photos(
            State(state),
            Json(DeletePhotosReq {
                file_names: vec!["../../etc/passwd".into()],
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn serves_stored_bytes_with_mime() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("pic.jpeg"), b"\xff\xd8\xff").unwrap();
        let state = state(tmp.path(), 1024).await;

        let response = get_upload(State(state.clone()), Path("pic.jpeg".into()))
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "3");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\xff\xd8\xff");

        let missing = get_upload(State(state), Path("nope.png".into()))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn delete_request_uses_camel_case() {
        let req: DeletePhotosReq =
            serde_json::from_str(r#"{"fileNames":["a.png","b.jpg"]}"#).unwrap();
        assert_eq!(req.file_names, vec!["a.png", "b.jpg"]);
    }
}
