//! Router construction and shared state for the agenda service.

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

use notelink_core::EventStore;

use crate::handlers;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared state injected into every handler.
///
/// Link mutations never enter through HTTP; they arrive solely via the
/// consumer, which shares this same store.
#[derive(Clone)]
pub struct AppState {
    /// The event store.
    pub events: Arc<dyn EventStore>,
}

/// Build the agenda-service router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/events", post(handlers::create_event))
        .route(
            "/api/v1/events/:id",
            get(handlers::get_event)
                .put(handlers::replace_event)
                .delete(handlers::delete_event),
        )
        .route("/api/v1/events/:id/tag", put(handlers::link_tag))
        .route(
            "/api/v1/dashboard/:user_id",
            get(handlers::dashboard),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
