use axum::Json;
use serde_json::{json, Value};

use crate::middleware::AuthUser;

/// Who is signed in.
pub async fn current_session(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "user": user }))
}
