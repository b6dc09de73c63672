use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::middleware::XeroSession;
use crate::AppState;

/// Organizations the signed-in user has connected.
pub async fn list_organizations(
    State(state): State<AppState>,
    xero: XeroSession,
) -> Result<Json<Value>, AppError> {
    let result = xero.client(&state).list_organizations().await;
    let organizations = xero.finish(&state, result).await?;

    tracing::debug!(count = organizations.len(), "Listed Xero organizations");

    Ok(Json(json!({ "organizations": organizations })))
}
