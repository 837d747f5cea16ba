//! Basic handlers.

use axum::Json;
use serde_json::{json, Value};

/// Liveness check.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "wxbridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
