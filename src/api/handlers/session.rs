use crate::AppState;
use crate::api::error::AppError;
use crate::models::{SelectedFile, SessionSnapshot};
use crate::services::session::SkipReason;
use crate::services::upload_widget::UploadOutcome;
use crate::utils::validation::{validate_file_name, validate_file_size};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Succeeded,
    Failed,
    SkippedNoFile,
    SkippedInProgress,
    Superseded,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub outcome: OutcomeKind,
    pub public_url: Option<String>,
    pub error: Option<String>,
    pub session: SessionSnapshot,
}

impl UploadResponse {
    pub fn new(outcome: &UploadOutcome, session: SessionSnapshot) -> Self {
        let (kind, public_url, error) = match outcome {
            UploadOutcome::Succeeded { public_url, .. } => {
                (OutcomeKind::Succeeded, Some(public_url.clone()), None)
            }
            UploadOutcome::Failed(err) => (OutcomeKind::Failed, None, Some(err.to_string())),
            UploadOutcome::Skipped(SkipReason::NoFile) => (OutcomeKind::SkippedNoFile, None, None),
            UploadOutcome::Skipped(SkipReason::InProgress) => {
                (OutcomeKind::SkippedInProgress, None, None)
            }
            UploadOutcome::Superseded => (OutcomeKind::Superseded, None, None),
        };
        Self {
            outcome: kind,
            public_url,
            error,
            session,
        }
    }
}

/// Body-limit failures surface as 413, anything else as a malformed form.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads the `file` field of a multipart body into a selection.
///
/// Returns `Ok(None)` when the form was submitted without choosing a file.
pub async fn read_selection(
    multipart: &mut Multipart,
    max_file_size: usize,
) -> Result<Option<SelectedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(multipart_error)?;

        if filename.is_empty() && data.is_empty() {
            return Ok(None);
        }

        validate_file_name(&filename).map_err(|e| AppError::BadRequest(e.to_string()))?;
        validate_file_size(data.len(), max_file_size)
            .map_err(|e| AppError::PayloadTooLarge(e.to_string()))?;

        return Ok(Some(SelectedFile::new(filename, content_type.as_deref(), data)));
    }

    Ok(None)
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current upload session", body = SessionSnapshot)
    ),
    tag = "session"
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.widget.snapshot().await)
}

#[utoipa::path(
    post,
    path = "/session/file",
    request_body(content = Object, description = "Multipart form with a `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File selected", body = SessionSnapshot),
        (status = 400, description = "No file in request"),
        (status = 413, description = "File too large")
    ),
    tag = "session"
)]
pub async fn select_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let file = read_selection(&mut multipart, state.config.max_file_size)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file found in request".to_string()))?;

    Ok(Json(state.widget.select_file(file).await))
}

#[utoipa::path(
    post,
    path = "/session/upload",
    responses(
        (status = 200, description = "Upload attempt finished or was skipped", body = UploadResponse)
    ),
    tag = "session"
)]
pub async fn upload(State(state): State<AppState>) -> Json<UploadResponse> {
    let outcome = state.widget.upload().await;
    let session = state.widget.snapshot().await;
    Json(UploadResponse::new(&outcome, session))
}

#[utoipa::path(
    get,
    path = "/session/preview",
    responses(
        (status = 200, description = "Selected image, served until it is uploaded"),
        (status = 404, description = "No local preview")
    ),
    tag = "session"
)]
pub async fn preview(State(state): State<AppState>) -> Result<Response, AppError> {
    let file = state
        .widget
        .local_preview_file()
        .await
        .ok_or_else(|| AppError::NotFound("No local preview".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        file.data.clone(),
    )
        .into_response())
}
