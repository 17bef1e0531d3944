//! Account data export and erasure endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use resellkit_store::{EntitlementDocument, SyncSnapshot};

use crate::auth::resolve_user_id;
use crate::error::ApiResult;
use crate::main_lib::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/account/export", post(account_export))
        .route("/account/delete", post(account_delete))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountExportResponse {
    user_id: String,
    exported_at: String,
    entitlement: Option<EntitlementDocument>,
    sync_snapshot: Option<SyncSnapshot>,
}

async fn account_export(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AccountExportResponse>> {
    let user_id = resolve_user_id(&headers, &state.config)?;
    let (entitlement, sync_snapshot) = tokio::try_join!(
        state.sync.get_entitlement(&user_id),
        state.sync.get_effective_snapshot(&user_id),
    )?;

    Ok(Json(AccountExportResponse {
        user_id,
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        entitlement,
        sync_snapshot,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountDeleteResponse {
    ok: bool,
    user_id: String,
    deleted_at: String,
}

async fn account_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AccountDeleteResponse>> {
    let user_id = resolve_user_id(&headers, &state.config)?;

    tokio::try_join!(
        state.sync.delete_entitlement(&user_id),
        state.sync.delete_all_sync_data(&user_id),
    )?;

    info!("account erasure completed for {}", user_id);
    Ok(Json(AccountDeleteResponse {
        ok: true,
        user_id,
        deleted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
