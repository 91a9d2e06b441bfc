use crate::AppState;
use crate::api::error::AppError;
use crate::models::{FileEntry, StoredFile};
use crate::utils::validation::{self, ValidationError};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartRejection},
        rejection::PathRejection,
    },
    http::{StatusCode, header},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub file: StoredFile,
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub count: usize,
    pub files: Vec<FileEntry>,
    pub storage_path: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Multipart, description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing file part, empty filename or disallowed type"),
        (status = 413, description = "File exceeds the upload limit")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart?;

    while let Some(mut field) = multipart.next_field().await? {
        // Plain form values named `file` are not file parts
        if field.name() != Some("file") || field.file_name().is_none() {
            continue;
        }

        let raw_filename = field.file_name().unwrap_or_default().to_string();

        // Reject on the name alone before buffering any content
        validation::validate_upload(
            &raw_filename,
            0,
            &state.config.allowed_extensions,
            state.config.max_upload_bytes,
        )?;

        let content = read_capped(&mut field, state.config.max_upload_bytes).await?;
        let stored = state.storage.save_upload(&raw_filename, content).await?;

        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            file: stored,
        }));
    }

    Err(AppError::BadRequest("No file part".to_string()))
}

/// Buffers a multipart field, failing as soon as it grows past `max` bytes.
async fn read_capped(field: &mut Field<'_>, max: usize) -> Result<Bytes, AppError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field.chunk().await? {
        let size = buffer.len() + chunk.len();
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max }.into());
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Files in the storage directory", body = FileListResponse),
        (status = 500, description = "Storage directory could not be read")
    ),
    tag = "files"
)]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FileListResponse>, AppError> {
    let files = state.storage.list_files().await?;

    Ok(Json(FileListResponse {
        count: files.len(),
        files,
        storage_path: state.storage.root().display().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File contents as an attachment"),
        (status = 400, description = "Invalid file name or not a regular file"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(filename) = filename.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let download = state.storage.fetch_file(&filename).await?;

    tracing::info!("📎 Sending {} ({} bytes)", download.name, download.size);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&download.name).to_string())
        .header(header::CONTENT_LENGTH, download.size)
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&download.name),
        )
        .body(Body::from_stream(ReaderStream::new(download.file)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub(crate) fn content_type_for(filename: &str) -> mime::Mime {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "pdf" => mime::APPLICATION_PDF,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "json" => mime::APPLICATION_JSON,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// `attachment` disposition with an ASCII fallback name plus the RFC 5987 form.
pub(crate) fn attachment_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}
