//! Privilege gate. Reads the admin flag AuthGate left in the request scope.
//!
//! Compose it inside (after) the access gate. Without one the flag is never
//! set, so every request is refused.

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::RequestScope;
use crate::error::AppError;

pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn(admin_middleware))
}

async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let is_admin = RequestScope::from_extensions(req.extensions()).is_some_and(|s| s.is_admin());
    if !is_admin {
        return Err(AppError::PrivilegeRequired);
    }

    Ok(next.run(req).await)
}
