/*
 * Responsibility
 * - GET /me: AuthGate が scope に載せた identity をそのまま返す
 */
use axum::Json;

use crate::api::v1::{dto::identity::IdentityResponse, extractors::Scope};

pub async fn me(Scope(scope): Scope) -> Json<IdentityResponse> {
    tracing::debug!(parent: &scope.identity_logger(), "identity requested");
    Json(IdentityResponse::from(&*scope))
}
