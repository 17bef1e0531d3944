//! Cloud sync pull/push endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use resellkit_core::sync::{next_version, SyncPushPayload};
use resellkit_store::SyncSnapshot;

use crate::auth::resolve_user_id;
use crate::error::ApiResult;
use crate::main_lib::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/pull", post(sync_pull))
        .route("/sync/push", post(sync_push))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncPullResponse {
    user_id: String,
    snapshot: SyncSnapshot,
}

async fn sync_pull(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SyncPullResponse>> {
    let user_id = resolve_user_id(&headers, &state.config)?;
    let snapshot = state
        .sync
        .get_effective_snapshot(&user_id)
        .await?
        .unwrap_or_else(SyncSnapshot::empty);

    debug!("sync pull for {}: v{}", user_id, snapshot.version);
    Ok(Json(SyncPullResponse { user_id, snapshot }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncPushResponse {
    ok: bool,
    user_id: String,
    version: i64,
    updated_at: Option<String>,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    upserted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted_count: Option<usize>,
}

async fn sync_push(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<SyncPushResponse>> {
    let user_id = resolve_user_id(&headers, &state.config)?;
    let payload = SyncPushPayload::parse(&body)?;

    let existing = state.sync.get_effective_snapshot(&user_id).await?;
    let previous_version = existing.as_ref().map(|s| s.version).unwrap_or(0);
    let version = next_version(previous_version, payload.client_version.unwrap_or(0.0));
    let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let summary = state
        .sync
        .apply_incremental_sync(&user_id, &payload, version, &updated_at)
        .await?;

    if !summary.changed {
        // No-op push: the prior version/timestamp stand and counts are
        // omitted, so idle re-pushes never look like updates to other
        // clients.
        return Ok(Json(SyncPushResponse {
            ok: true,
            user_id,
            version: previous_version,
            updated_at: existing.and_then(|s| s.updated_at),
            changed: false,
            upserted_count: None,
            deleted_count: None,
        }));
    }

    info!(
        "sync push for {}: v{} (+{} -{})",
        user_id, version, summary.upserted_count, summary.deleted_count
    );
    Ok(Json(SyncPushResponse {
        ok: true,
        user_id,
        version,
        updated_at: Some(updated_at),
        changed: true,
        upserted_count: Some(summary.upserted_count),
        deleted_count: Some(summary.deleted_count),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{post_json, test_router};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn push_then_pull_roundtrip() {
        let router = test_router();

        let (status, body) = post_json(
            &router,
            "/sync/push",
            Some("user-1"),
            json!({
                "presets": [{ "id": "1", "name": "A" }],
                "salesByPreset": { "1": [{ "id": 10, "price": 7 }] },
                "clientVersion": 0
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["version"], json!(1));
        assert_eq!(body["changed"], json!(true));
        assert_eq!(body["upsertedCount"], json!(1));
        assert_eq!(body["deletedCount"], json!(0));

        let (status, body) = post_json(&router, "/sync/pull", Some("user-1"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], json!("user-1"));
        assert_eq!(
            body["snapshot"]["presets"],
            json!([{ "id": "1", "name": "A" }])
        );
        assert_eq!(
            body["snapshot"]["salesByPreset"]["1"],
            json!([{ "id": 10, "price": 7 }])
        );
        assert_eq!(body["snapshot"]["version"], json!(1));
    }

    #[tokio::test]
    async fn pull_for_fresh_user_returns_default_empty_snapshot() {
        let router = test_router();

        let (status, body) = post_json(&router, "/sync/pull", Some("fresh"), json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["snapshot"],
            json!({
                "presets": [],
                "salesByPreset": {},
                "version": 0,
                "updatedAt": null
            })
        );
    }

    #[tokio::test]
    async fn identical_push_reports_unchanged_and_keeps_version() {
        let router = test_router();
        let payload = json!({
            "presets": [{ "id": "1", "name": "A" }],
            "salesByPreset": { "1": [] },
            "clientVersion": 0
        });

        let (_, first) = post_json(&router, "/sync/push", Some("user-1"), payload.clone()).await;
        assert_eq!(first["version"], json!(1));

        let (status, second) = post_json(&router, "/sync/push", Some("user-1"), payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["changed"], json!(false));
        assert_eq!(second["version"], json!(1));
        assert!(second.get("upsertedCount").is_none());
        assert!(second.get("deletedCount").is_none());
    }

    #[tokio::test]
    async fn emptying_push_deletes_and_bumps_version() {
        let router = test_router();
        post_json(
            &router,
            "/sync/push",
            Some("user-1"),
            json!({
                "presets": [{ "id": "1", "name": "A" }],
                "salesByPreset": { "1": [{ "id": 10, "price": 7 }] },
                "clientVersion": 0
            }),
        )
        .await;

        let (status, body) = post_json(
            &router,
            "/sync/push",
            Some("user-1"),
            json!({ "presets": [], "salesByPreset": {}, "clientVersion": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["upsertedCount"], json!(0));
        assert_eq!(body["deletedCount"], json!(1));
        assert_eq!(body["version"], json!(2));

        let (_, body) = post_json(&router, "/sync/pull", Some("user-1"), json!({})).await;
        assert_eq!(body["snapshot"]["presets"], json!([]));
    }

    #[tokio::test]
    async fn client_ahead_of_server_is_respected() {
        let router = test_router();

        let (_, body) = post_json(
            &router,
            "/sync/push",
            Some("user-1"),
            json!({
                "presets": [{ "id": "1" }],
                "salesByPreset": {},
                "clientVersion": 41
            }),
        )
        .await;
        assert_eq!(body["version"], json!(42));
    }

    #[tokio::test]
    async fn duplicate_preset_ids_are_rejected_before_storage() {
        let router = test_router();

        let (status, body) = post_json(
            &router,
            "/sync/push",
            Some("user-1"),
            json!({
                "presets": [{ "id": "1" }, { "id": "1" }],
                "salesByPreset": {}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Duplicate preset id"));

        // Nothing was persisted.
        let (_, body) = post_json(&router, "/sync/pull", Some("user-1"), json!({})).await;
        assert_eq!(body["snapshot"]["version"], json!(0));
    }

    #[tokio::test]
    async fn requests_without_identity_are_unauthorized() {
        let router = test_router();

        let (status, _) = post_json(&router, "/sync/pull", None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = post_json(
            &router,
            "/sync/push",
            None,
            json!({ "presets": [], "salesByPreset": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
