/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: auth: AuthGate (検証鍵は読み取り専用で全リクエストから共有)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::access::AuthGate;
use crate::services::auth::access_jwt::TokenValidator;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: AuthGate,
}

impl AppState {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            auth: AuthGate::new(validator),
        }
    }
}
