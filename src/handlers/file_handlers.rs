//! HTTP handlers for file operations.
//! Uploads are buffered (multipart or raw body) and handed to `FileStorage`;
//! everything about the on-disk layout stays in the storage service.

use crate::{
    errors::AppError,
    models::file::{FileInfoResponse, FileMetadata, FileUploadResponse},
    services::content_types::{DEFAULT_CONTENT_TYPE, content_type_for_extension},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

/// Header carrying the client filename on raw uploads.
pub const X_FILENAME: HeaderName = HeaderName::from_static("x-filename");
pub const X_FILE_ID: HeaderName = HeaderName::from_static("x-file-id");
pub const X_ORIGINAL_NAME: HeaderName = HeaderName::from_static("x-original-name");

/// Filename recorded for raw uploads that do not send `X-Filename`.
const DEFAULT_UPLOAD_NAME: &str = "uploaded_file";

/// Multipart field that carries the file.
const FILE_FIELD: &str = "file";

/// An upload after the request body has been decoded.
struct Upload {
    content: Bytes,
    original_name: String,
    content_type: String,
}

/// POST `/api/v1/files` — store a file from a multipart form or a raw body.
pub async fn upload_file(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("multipart/form-data"));

    let upload = if is_multipart {
        read_multipart_upload(&state, request).await?
    } else {
        read_raw_upload(&state, request).await?
    };

    let metadata = state
        .storage
        .store(&upload.content, &upload.original_name, &upload.content_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FileUploadResponse::from(&metadata)),
    ))
}

/// GET `/api/v1/files/{id}` — return the stored bytes.
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (content, meta) = state.storage.retrieve(&id).await?;
    let length = content.len();

    let mut response = Response::new(Body::from(content));
    *response.status_mut() = StatusCode::OK;
    set_file_headers(response.headers_mut(), &meta, length);

    Ok(response)
}

/// GET `/api/v1/files/{id}/info` — metadata as JSON.
pub async fn get_file_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileInfoResponse>, AppError> {
    let meta = state.storage.get_metadata(&id).await?;
    Ok(Json(FileInfoResponse::from(meta)))
}

/// DELETE `/api/v1/files/{id}`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.storage.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// HEAD `/api/v1/files/{id}` — 200 when the file is fully present.
pub async fn head_file(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.storage.exists(&id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn read_multipart_upload(state: &AppState, request: Request) -> Result<Upload, AppError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|_| AppError::bad_request("Failed to parse multipart form"))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::new(err.status(), "Failed to parse multipart form"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|err| AppError::new(err.status(), "Failed to read file content"))?;

        return Ok(Upload {
            content,
            original_name,
            content_type,
        });
    }

    Err(AppError::bad_request("No file provided"))
}

async fn read_raw_upload(state: &AppState, request: Request) -> Result<Upload, AppError> {
    let headers = request.headers();
    let original_name = headers
        .get(&X_FILENAME)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_UPLOAD_NAME)
        .to_string();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| content_type_for_extension(&original_name));

    let content = Bytes::from_request(request, state)
        .await
        .map_err(|rejection| AppError::new(rejection.status(), "Failed to read request body"))?;

    Ok(Upload {
        content,
        original_name,
        content_type,
    })
}

fn set_file_headers(headers: &mut HeaderMap, meta: &FileMetadata, length: usize) {
    let content_type = HeaderValue::from_str(&meta.content_type)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    let disposition = format!(
        "inline; filename=\"{}\"",
        meta.original_name.replace('"', "'")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("inline")),
    );

    if let Ok(value) = HeaderValue::from_str(&meta.id) {
        headers.insert(X_FILE_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(&meta.original_name) {
        headers.insert(X_ORIGINAL_NAME, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(original_name: &str, content_type: &str) -> FileMetadata {
        let now = Utc::now();
        FileMetadata {
            id: "0d6c9d1e-27a4-4c36-bb0e-5a2b9a3f7c10".into(),
            original_name: original_name.into(),
            content_type: content_type.into(),
            size: 3,
            extension: ".bin".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn headers_describe_the_file() {
        let mut headers = HeaderMap::new();
        set_file_headers(&mut headers, &meta("photo.png", "image/png"), 3);

        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "inline; filename=\"photo.png\""
        );
        assert_eq!(headers[X_FILE_ID], "0d6c9d1e-27a4-4c36-bb0e-5a2b9a3f7c10");
        assert_eq!(headers[X_ORIGINAL_NAME], "photo.png");
    }

    #[test]
    fn empty_content_type_falls_back_to_octet_stream() {
        let mut headers = HeaderMap::new();
        set_file_headers(&mut headers, &meta("", ""), 0);
        assert_eq!(headers[header::CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn unrepresentable_names_are_dropped_from_headers() {
        let mut headers = HeaderMap::new();
        set_file_headers(&mut headers, &meta("line\nbreak", "text/plain"), 1);
        assert_eq!(headers[header::CONTENT_DISPOSITION], "inline");
        assert!(!headers.contains_key(X_ORIGINAL_NAME));
    }
}
