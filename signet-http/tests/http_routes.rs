use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use signet_core::config::SignetConfig;
use signet_embeddings::noop::NoopProvider;
use signet_http::{build_router, AppState};
use signet_repair::RepairRegistry;
use signet_session::SessionManager;
use signet_storage::Accessor;

fn test_state() -> Arc<AppState> {
    let accessor = Accessor::init_in_memory().unwrap();
    Arc::new(AppState {
        accessor,
        embeddings: Arc::new(NoopProvider::new(8)),
        reranker: None,
        config: SignetConfig::default(),
        repair: RepairRegistry::new(),
        sessions: SessionManager::new(),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn remember_then_recall_round_trips_through_http() {
    let app = build_router(test_state());

    let remember_req = Request::builder()
        .method("POST")
        .uri("/api/memory/remember")
        .header("content-type", "application/json")
        .body(Body::from(json!({"content": "rotate keys weekly"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(remember_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remembered = body_json(response).await;
    assert_eq!(remembered["content"], "rotate keys weekly");
    assert_eq!(remembered["embedded"], false);

    let recall_req = Request::builder()
        .method("POST")
        .uri("/api/memory/recall")
        .header("content-type", "application/json")
        .body(Body::from(json!({"query": "rotate keys"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(recall_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let recalled = body_json(response).await;
    assert_eq!(recalled["results"][0]["content"], "rotate keys weekly");
}

#[tokio::test]
async fn remember_with_empty_content_is_bad_request() {
    let app = build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/api/memory/remember")
        .header("content-type", "application/json")
        .body(Body::from(json!({"content": "   "}).to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn forget_on_a_pinned_memory_without_force_is_a_conflict() {
    let app = build_router(test_state());
    let remember_req = Request::builder()
        .method("POST")
        .uri("/api/memory/remember")
        .header("content-type", "application/json")
        .body(Body::from(json!({"content": "critical: rotate keys"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(remember_req).await.unwrap();
    let remembered = body_json(response).await;
    assert_eq!(remembered["pinned"], true);
    let id = remembered["id"].as_str().unwrap().to_string();

    let forget_req = Request::builder()
        .method("POST")
        .uri("/api/memory/forget")
        .header("content-type", "application/json")
        .body(Body::from(json!({"id": id}).to_string()))
        .unwrap();
    let response = app.oneshot(forget_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "pinned_requires_force");
}

#[tokio::test]
async fn forget_from_a_pipeline_actor_is_forbidden_even_with_force() {
    let app = build_router(test_state());
    let remember_req = Request::builder()
        .method("POST")
        .uri("/api/memory/remember")
        .header("content-type", "application/json")
        .body(Body::from(json!({"content": "critical: rotate keys"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(remember_req).await.unwrap();
    let remembered = body_json(response).await;
    let id = remembered["id"].as_str().unwrap().to_string();

    let forget_req = Request::builder()
        .method("POST")
        .uri("/api/memory/forget")
        .header("content-type", "application/json")
        .body(Body::from(json!({"id": id, "force": true, "actorType": "pipeline"}).to_string()))
        .unwrap();
    let response = app.oneshot(forget_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "autonomous_force_denied");
}

#[tokio::test]
async fn health_is_always_ok_and_status_reports_active_count() {
    let app = build_router(test_state());

    let response = app.clone().oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["active_memories"], 0);
}

#[tokio::test]
async fn repair_rejects_an_unknown_action_name() {
    let app = build_router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/api/repair/notARealAction")
        .header("content-type", "application/json")
        .body(Body::from(json!({"reason": "test", "actor": "tester", "actorType": "operator"}).to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "internal_error");
}
