use axum::Json;
use serde_json::{json, Value};

/// GET /health - liveness only; does not touch the identity provider or the data backend
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
