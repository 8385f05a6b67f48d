/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は公開、/me と /ws は AuthGate、/admin 配下は AuthGate + AdminGate
 * - gate は route_layer で適用 (未定義パスは 404 のまま)
 */
use axum::{Router, routing::get};

use crate::middleware::auth::{access, admin};
use crate::state::AppState;

use crate::api::v1::handlers::{admin::status, health::health, me::me, ws::echo};

pub fn routes(state: AppState) -> Router<AppState> {
    // admin gate は内側: access gate が identity を載せた後に評価される
    let admin_routes = admin::apply(Router::new().route("/admin/status", get(status)));

    let protected = Router::new()
        .route("/me", get(me))
        .route("/ws", get(echo))
        .merge(admin_routes);
    let protected = access::apply(protected, state.auth);

    Router::new().route("/health", get(health)).merge(protected)
}
