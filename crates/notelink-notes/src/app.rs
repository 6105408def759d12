//! Router construction and shared state for the note service.

use std::sync::Arc;

use axum::{
    http::Request,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use notelink_bus::LinkPublisher;
use notelink_core::NoteStore;

use crate::handlers;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation across the two services.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The note store.
    pub notes: Arc<dyn NoteStore>,
    /// Publisher for link envelopes.
    pub publisher: LinkPublisher,
}

/// Build the note-service router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/notes", post(handlers::create_note))
        .route(
            "/api/v1/notes/:id",
            get(handlers::get_note)
                .put(handlers::replace_note)
                .delete(handlers::delete_note),
        )
        .route("/api/v1/notes/:id/content", put(handlers::update_content))
        .route("/api/v1/notes/:id/tag", put(handlers::link_tag))
        .route("/api/v1/notes/:id/event", put(handlers::link_event))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
