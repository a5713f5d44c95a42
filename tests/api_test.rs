//! Dashboard API Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.
//! No keys are configured, so every search is served from demo data.
//! Run with: cargo test --test api_test

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use insta_analytics::api::{create_router, AppState};
use insta_analytics::core::secrets::{EnvLookup, SecretsPaths};
use insta_analytics::models::AiProvider;
use insta_analytics::{AppConfig, BookmarkStore, SecretsStore, TelemetryCollector};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let lookup: EnvLookup = Arc::new(|_: &str| None);
    let missing = PathBuf::from("/nonexistent/insta_api_test");
    let paths = SecretsPaths {
        env_file: missing.join(".env"),
        secrets_toml: missing.join("secrets.toml"),
        config_yaml: missing.join("config.yaml"),
    };
    let secrets = Arc::new(SecretsStore::with_sources(lookup, paths, AiProvider::None));

    let state = Arc::new(AppState::new(
        AppConfig::default(),
        secrets,
        BookmarkStore::in_memory(),
        Arc::new(TelemetryCollector::new()),
    ));
    create_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = test_app();

    let (status, body) = get(&app, "/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert!(body["latency_ms"].is_number());

    let response = app
        .clone()
        .oneshot(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_status_reports_missing_keys() {
    let app = test_app();
    let (status, body) = get(&app, "/v1/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["apify_connected"], false);
    assert_eq!(body["data"]["ai_connected"], false);
    assert_eq!(body["data"]["missing_keys"], json!(["apify_token"]));
    assert_eq!(body["data"]["keys"].as_array().unwrap().len(), 5);
    assert!(body["data"].get("probe").is_none());
}

#[tokio::test]
async fn test_settings_and_hashtags() {
    let app = test_app();

    let (_, body) = get(&app, "/v1/settings").await;
    assert_eq!(body["data"]["posts_per_row"], 3);
    assert_eq!(body["data"]["default_time_filter"], "month");
    assert_eq!(body["data"]["time_filters"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["time_filters"][1]["label"], "48 Hours");
    assert_eq!(
        body["data"]["post_types"],
        json!(["all", "posts", "carousels", "reels"])
    );

    let (status, body) = get(&app, "/v1/hashtags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 4);
    let all = body["data"]["all"].as_array().unwrap();
    assert!(all.contains(&json!("#ui")));
}

#[tokio::test]
async fn test_search_serves_demo_posts() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/v1/posts/search",
        json!({ "hashtags": ["UI", "#tech"], "post_type": "reels", "limit": 9 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["source"], "demo");
    assert_eq!(data["hashtags"], json!(["#ui", "#tech"]));
    assert_eq!(data["total"], 9);
    assert_eq!(data["metrics"]["total_posts"], 9);

    let posts = data["posts"].as_array().unwrap();
    assert!(posts.iter().all(|p| p["post_type"] == "reels"));
    assert!(posts.iter().all(|p| p["bookmarked"] == false));
    let likes: Vec<u64> = posts.iter().map(|p| p["likes"].as_u64().unwrap()).collect();
    assert!(likes.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_search_rejects_unknown_filter() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/v1/posts/search",
        json!({ "hashtags": ["#ui"], "time_filter": "decade" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_bookmark_toggle_flow() {
    let app = test_app();
    post_json(&app, "/v1/posts/search", json!({ "hashtags": ["#ui"], "limit": 5 })).await;

    let (status, body) = post_json(&app, "/v1/bookmarks/post_2/toggle", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bookmarked"], true);
    assert_eq!(body["data"]["total"], 1);

    let (_, body) = get(&app, "/v1/bookmarks").await;
    assert_eq!(body["data"]["ids"], json!(["post_2"]));
    assert_eq!(body["data"]["posts"][0]["id"], "post_2");

    let (_, body) = post_json(&app, "/v1/bookmarks/post_2/toggle", json!({})).await;
    assert_eq!(body["data"]["bookmarked"], false);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_analyze_uses_fallback_without_provider() {
    let app = test_app();

    let (status, body) = post_json(
        &app,
        "/v1/analyze",
        json!({ "caption": "Fresh onboarding flow #ux #design" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ai_available"], false);
    assert_eq!(body["data"]["analysis"]["category"], "General");
    assert_eq!(body["data"]["analysis"]["content_quality"], 75);

    // post ids resolve against the last search only
    let (status, body) = post_json(&app, "/v1/analyze", json!({ "post_id": "post_1" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "API_NOT_FOUND");

    post_json(&app, "/v1/posts/search", json!({ "limit": 3 })).await;
    let (status, body) = post_json(&app, "/v1/analyze", json!({ "post_id": "post_1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["post_id"], "post_1");

    let (status, _) = post_json(&app, "/v1/analyze", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_count_searches() {
    let app = test_app();
    post_json(&app, "/v1/posts/search", json!({ "limit": 4 })).await;
    post_json(&app, "/v1/posts/search", json!({ "limit": 4 })).await;

    let (status, body) = get(&app, "/v1/stats").await;
    assert_eq!(status, StatusCode::OK);
    let telemetry = &body["data"]["telemetry"];
    assert_eq!(telemetry["total_searches"], 2);
    assert_eq!(telemetry["posts_served"], 8);
    assert_eq!(telemetry["searches_by_source"]["demo"], 2);
    // demo results are never cached
    assert_eq!(body["data"]["cache"]["entries"], 0);
}

#[tokio::test]
async fn test_malformed_input_keeps_envelope() {
    let app = test_app();

    // negative limit fails to deserialize into usize
    let (status, body) = post_json(
        &app,
        "/v1/posts/search",
        json!({ "hashtags": ["ui"], "limit": -1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
    assert!(body["latency_ms"].is_number());

    let request = Request::post("/v1/analyze")
        .header("content-type", "application/json")
        .body(Body::from("{\"caption\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");

    let request = Request::post("/v1/posts/search")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = get(&app, "/v1/status?probe=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
    assert!(body.get("data").is_none());
}
