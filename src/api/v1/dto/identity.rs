/*
 * Responsibility
 * - 認証済み主体を返す response DTO
 */
use serde::Serialize;
use uuid::Uuid;

use crate::api::v1::extractors::RequestScope;

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

impl From<&RequestScope> for IdentityResponse {
    fn from(scope: &RequestScope) -> Self {
        Self {
            id: scope.user_id(),
            email: scope.email().to_string(),
            name: scope.name().to_string(),
            is_admin: scope.is_admin(),
        }
    }
}
