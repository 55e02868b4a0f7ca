//! Route handlers
//!
//! Conversions run on the blocking pool; everything else stays async.

use super::error::ApiError;
use super::form::{ReprocessBody, UploadForm};
use super::AppState;
use crate::services::{StorageLayout, StoredKind};
use crate::types::VectorArtifact;
use axum::body::Bytes;
use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded_file_url: String,
    pub input_filename: String,
    pub svg_file_url: String,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct ReprocessResponse {
    pub svg_file_url: String,
    pub download_url: String,
}

impl From<&VectorArtifact> for ReprocessResponse {
    fn from(artifact: &VectorArtifact) -> Self {
        Self {
            svg_file_url: format!("/output/{}", artifact.file_name),
            download_url: format!("/download/{}", artifact.file_name),
        }
    }
}

fn join_error(e: tokio::task::JoinError, prefix: &str) -> ApiError {
    warn!("Conversion task failed: {}", e);
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{}: worker task failed", prefix),
    )
}

/// `POST /` multipart upload and conversion
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut form = UploadForm::default();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            file = Some((file_name, data));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
            form.insert(name, value);
        }
    }

    let (file_name, data) = file.ok_or_else(|| ApiError::bad_request("No file part"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }
    if StorageLayout::allowed_extension(&file_name).is_none() {
        return Err(ApiError::bad_request("File type not allowed"));
    }
    let request = form.to_request()?;
    debug!(?request, file = %file_name, bytes = data.len(), "Upload received");

    let pipeline = state.pipeline.clone();
    let (source, artifact) = tokio::task::spawn_blocking(move || {
        let source = pipeline.store_upload(&file_name, &data)?;
        let artifact = pipeline.convert(&source, &request)?;
        Ok::<_, crate::error::VectorizeError>((source, artifact))
    })
    .await
    .map_err(|e| join_error(e, "Processing failed"))?
    .map_err(|e| ApiError::from_pipeline(&e, "Processing failed"))?;

    info!(source = %source.file_name, svg = %artifact.file_name, "Upload converted");
    let links = ReprocessResponse::from(&artifact);
    Ok(Json(UploadResponse {
        uploaded_file_url: format!("/uploads/{}", source.file_name),
        input_filename: source.file_name,
        svg_file_url: links.svg_file_url,
        download_url: links.download_url,
    }))
}

/// `POST /reprocess` conversion of an existing upload with new settings
pub async fn reprocess(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReprocessResponse>, ApiError> {
    let ReprocessBody {
        input_filename,
        request,
    } = ReprocessBody::parse(&body)?;
    debug!(?request, source = %input_filename, "Reprocess requested");

    let pipeline = state.pipeline.clone();
    let artifact = tokio::task::spawn_blocking(move || {
        let source = pipeline.resolve_source(&input_filename)?;
        pipeline.convert(&source, &request)
    })
    .await
    .map_err(|e| join_error(e, "Reprocessing failed"))?
    .map_err(|e| ApiError::from_pipeline(&e, "Reprocessing failed"))?;

    info!(svg = %artifact.file_name, "Reprocess converted");
    Ok(Json(ReprocessResponse::from(&artifact)))
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn serve_stored(
    state: &AppState,
    kind: StoredKind,
    file_name: &str,
    attachment: bool,
) -> Response {
    let path = match state.pipeline.layout().resolve_stored(kind, file_name) {
        Ok(path) => path,
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::NOT_FOUND);
            return (status, e.to_string()).into_response();
        },
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        },
    };

    let mut resp = Response::new(bytes.into());
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(file_name)),
    );
    if attachment {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        {
            resp.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
    }
    resp
}

/// `GET /download/:filename` output SVG as an attachment
pub async fn download(
    State(state): State<AppState>,
    AxumPath(file_name): AxumPath<String>,
) -> Response {
    serve_stored(&state, StoredKind::Output, &file_name, true).await
}

/// `GET /uploads/:filename` raw uploaded source
pub async fn uploaded_file(
    State(state): State<AppState>,
    AxumPath(file_name): AxumPath<String>,
) -> Response {
    serve_stored(&state, StoredKind::Upload, &file_name, false).await
}

/// `GET /output/:filename` raw SVG
pub async fn output_file(
    State(state): State<AppState>,
    AxumPath(file_name): AxumPath<String>,
) -> Response {
    serve_stored(&state, StoredKind::Output, &file_name, false).await
}

pub async fn healthz() -> impl IntoResponse {
    "ok"
}
