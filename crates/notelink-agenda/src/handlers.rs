//! HTTP handlers for the agenda service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use notelink_core::{CreateEventRequest, Error, Event, LinkTagRequest};

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

/// `POST /api/v1/events` — create an event. New events start unlinked.
pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Uuid>), ApiError> {
    let id = state.events.insert(req).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

/// `GET /api/v1/events/:id` — fetch an event.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.events.fetch(id).await?))
}

/// `PUT /api/v1/events/:id` — replace an event wholesale.
///
/// The stored note back-reference is preserved; it changes only through
/// envelopes arriving on the bus.
pub async fn replace_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = Event {
        id,
        user_id: req.user_id,
        tag_id: req.tag_id,
        // Ignored by the store; replace keeps the existing back-reference.
        note_id: notelink_core::SENTINEL,
        time: req.time,
        title: req.title,
    };
    Ok(Json(state.events.replace(event).await?))
}

/// `DELETE /api/v1/events/:id` — delete an event.
///
/// No envelope is published: an event's disappearance never needs to be
/// propagated back to the note side.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.events.delete(id).await?;
    Ok(StatusCode::OK)
}

/// `PUT /api/v1/events/:id/tag` — attach a tag.
pub async fn link_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LinkTagRequest>,
) -> Result<StatusCode, ApiError> {
    state.events.set_tag(id, req.tag_id).await?;
    Ok(StatusCode::OK)
}

/// `GET /api/v1/dashboard/:user_id` — list a user's events.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.events.list_for_user(user_id).await?))
}
