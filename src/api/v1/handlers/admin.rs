/*
 * Responsibility
 * - GET /admin/status: AdminGate を通過したリクエストのみ到達する
 */
use axum::Json;
use serde_json::{Value, json};

use crate::api::v1::extractors::Scope;

pub async fn status(Scope(scope): Scope) -> Json<Value> {
    tracing::info!(parent: &scope.identity_logger(), "admin status requested");
    Json(json!({ "status": "ok", "admin_id": scope.user_id() }))
}
