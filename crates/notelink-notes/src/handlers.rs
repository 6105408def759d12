//! HTTP handlers for the note service.
//!
//! Publish-triggering handlers report success once the broker accepts the
//! envelope; application happens asynchronously on the agenda side.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use notelink_core::{
    CreateNoteRequest, Error, LinkEventRequest, LinkTagRequest, Note, UpdateContentRequest,
};

use crate::app::AppState;

/// Maps core errors onto HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NoteNotFound(_) | Error::EventNotFound(_) => StatusCode::NOT_FOUND,
            Error::Envelope(_) => StatusCode::UNPROCESSABLE_ENTITY,
            e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/v1/notes` — create a note.
pub async fn create_note(
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Uuid>), ApiError> {
    let id = state.notes.insert(req).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// `GET /api/v1/notes/:id` — fetch a note.
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.fetch(id).await?))
}

/// `PUT /api/v1/notes/:id` — replace a note wholesale.
pub async fn replace_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let note = Note {
        id,
        user_id: req.user_id,
        tag_id: req.tag_id,
        title: req.title,
        content: req.content,
    };
    Ok(Json(state.notes.replace(note).await?))
}

/// `PUT /api/v1/notes/:id/content` — update content only.
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<StatusCode, ApiError> {
    state.notes.set_content(id, &req.content).await?;
    Ok(StatusCode::OK)
}

/// `PUT /api/v1/notes/:id/tag` — attach a tag.
pub async fn link_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkTagRequest>,
) -> Result<StatusCode, ApiError> {
    state.notes.set_tag(id, req.tag_id).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /api/v1/notes/:id` — delete a note, then publish the unlink.
///
/// The unlink envelope goes out only after the store confirms the delete.
/// A publish failure surfaces as 503 with the note already gone.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.notes.delete(id).await?;
    state.publisher.note_deleted(id).await?;
    Ok(StatusCode::OK)
}

/// `PUT /api/v1/notes/:id/event` — request a note↔event link.
///
/// Returns 202: the operation is queued, not applied.
pub async fn link_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkEventRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state.publisher.link_requested(id, req.event_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued" })),
    ))
}
