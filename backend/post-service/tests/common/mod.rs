//! Shared helpers for driving the router in-process.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use post_service::config::ApiConfig;
use post_service::store::MemoryPostStore;
use post_service::{api, PostController};
use serde_json::Value;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: MemoryPostStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(api_config: ApiConfig) -> Self {
        let store = MemoryPostStore::new();
        let router = api::router(PostController::new(store.clone(), &api_config));
        Self { router, store }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = serde_json::from_slice(&bytes).expect("JSON body");

        (status, json)
    }

    /// Create a post through the API and return its id
    pub async fn create(&self, title: &str) -> i64 {
        let (_, body) = self
            .request("POST", "/api/posts", Some(serde_json::json!({ "title": title })))
            .await;
        assert_eq!(body["status"], "success", "create failed: {body}");
        body["data"]["id"].as_i64().expect("numeric id")
    }
}
