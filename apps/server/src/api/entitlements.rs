//! Pro-entitlement lookup endpoint.
//!
//! Purchase verification is handled by an external flow; this endpoint only
//! reflects the persisted entitlement record.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::resolve_user_id;
use crate::error::ApiResult;
use crate::main_lib::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/entitlements/me", get(entitlements_me))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntitlementsMeResponse {
    user_id: String,
    has_pro_access: bool,
    updated_at: Option<String>,
}

async fn entitlements_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<EntitlementsMeResponse>> {
    let user_id = resolve_user_id(&headers, &state.config)?;
    let entitlement = state.sync.get_entitlement(&user_id).await?;

    Ok(Json(EntitlementsMeResponse {
        user_id,
        has_pro_access: entitlement
            .as_ref()
            .map(|e| e.has_pro_access)
            .unwrap_or(false),
        updated_at: entitlement.map(|e| e.updated_at),
    }))
}
