//! Shared helpers for handler tests: an in-memory-backed router and small
//! request drivers.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use resellkit_store::{MemoryDocumentStore, SyncRepository};

use crate::config::{ApiEnvironment, ServerConfig};
use crate::main_lib::{build_router, AppState};

pub fn test_router() -> Router {
    let config = ServerConfig {
        api_env: ApiEnvironment::Dev,
        auth_bypass_dev: true,
        bind_addr: "127.0.0.1:0".to_string(),
        allowed_origins: vec!["*".to_string()],
    };
    let store = Arc::new(MemoryDocumentStore::new());
    build_router(Arc::new(AppState {
        config,
        sync: SyncRepository::new(store),
    }))
}

async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn post_json(
    router: &Router,
    uri: &str,
    user_id: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    request(router, "POST", uri, user_id, Some(body)).await
}

pub async fn get(router: &Router, uri: &str, user_id: Option<&str>) -> (StatusCode, Value) {
    request(router, "GET", uri, user_id, None).await
}
