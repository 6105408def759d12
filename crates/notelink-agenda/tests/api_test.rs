//! HTTP-level tests for the agenda service.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use notelink_agenda::{app, AppState};
use notelink_bus::{LinkConsumer, MemoryBus, MessageBus};
use notelink_core::{EventStore, LinkEnvelope, LINK_QUEUE};
use notelink_db::MemoryEventStore;

fn test_app() -> (Router, Arc<MemoryEventStore>) {
    let events = Arc::new(MemoryEventStore::new());
    let state = AppState {
        events: events.clone(),
    };
    (app(state), events)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_event(app: &Router, user_id: Uuid) -> Uuid {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/events",
            json!({
                "user_id": user_id,
                "tag_id": null,
                "time": Utc::now(),
                "title": "standup"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app();
    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_created_event_starts_unlinked() {
    let (app, _) = test_app();
    let id = create_event(&app, Uuid::new_v4()).await;

    let response = app
        .oneshot(empty_request("GET", &format!("/api/v1/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["note_id"].as_str().unwrap().parse::<Uuid>().unwrap(),
        Uuid::nil()
    );
}

#[tokio::test]
async fn test_get_missing_event_returns_404() {
    let (app, _) = test_app();
    let response = app
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/events/{}", Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_event_preserves_link() {
    let (app, events) = test_app();
    let user_id = Uuid::new_v4();
    let id = create_event(&app, user_id).await;

    let note_id = Uuid::new_v4();
    events.link_note(id, note_id).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/events/{}", id),
            json!({
                "user_id": user_id,
                "tag_id": null,
                "time": Utc::now(),
                "title": "retro"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "retro");
    assert_eq!(
        body["note_id"].as_str().unwrap().parse::<Uuid>().unwrap(),
        note_id
    );
}

#[tokio::test]
async fn test_delete_event() {
    let (app, _) = test_app();
    let id = create_event(&app, Uuid::new_v4()).await;

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/api/v1/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(empty_request("GET", &format!("/api/v1/events/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_filters_by_user() {
    let (app, _) = test_app();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    create_event(&app, alice).await;
    create_event(&app, alice).await;
    create_event(&app, bob).await;

    let response = app
        .oneshot(empty_request("GET", &format!("/api/v1/dashboard/{}", alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_link_tag() {
    let (app, events) = test_app();
    let id = create_event(&app, Uuid::new_v4()).await;
    let tag_id = Uuid::new_v4();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/events/{}/tag", id),
            json!({ "tag_id": tag_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let event = events.fetch(id).await.unwrap();
    assert_eq!(event.tag_id, Some(tag_id));
}

// A link envelope consumed off the bus becomes visible through the HTTP
// surface the service exposes.
#[tokio::test]
async fn test_consumed_link_visible_over_http() {
    let events = Arc::new(MemoryEventStore::new());
    let bus: Arc<dyn MessageBus> = Arc::new(MemoryBus::new());
    let app = app(AppState {
        events: events.clone(),
    });

    let id = create_event(&app, Uuid::new_v4()).await;
    let note_id = Uuid::new_v4();

    let consumer = LinkConsumer::new(events.clone(), bus.clone());
    let subscription = consumer.subscribe().await.unwrap();
    let handle = consumer.start(subscription);

    let payload = LinkEnvelope::link(id, note_id).encode();
    bus.publish(LINK_QUEUE, payload.into_bytes()).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/v1/events/{}", id)))
            .await
            .unwrap();
        let body = body_json(response).await;
        let linked: Uuid = body["note_id"].as_str().unwrap().parse().unwrap();
        if linked == note_id {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "link never became visible"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    handle.shutdown().await;
}
