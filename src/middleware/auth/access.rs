//! Bearer access-token gate: header extraction → validation → identity in scope.
//!
//! Every failure is terminal: the downstream handler never runs and the
//! client receives one of the [`AppError`] 401 bodies. The gate does not log;
//! the request's outcome is recorded by the instrumentation layer.

use std::fmt;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use uuid::Uuid;

use crate::api::v1::extractors::RequestScope;
use crate::error::AppError;
use crate::services::auth::access_jwt::{Claims, TokenValidator};

/// Authenticates requests against a shared [`TokenValidator`].
#[derive(Clone)]
pub struct AuthGate {
    validator: Arc<dyn TokenValidator>,
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }

    /// Runs the full check sequence on `headers`, failing fast.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(Uuid, Claims), AppError> {
        let token = bearer_token(headers)?;
        let claims = self.validator.validate(token)?;

        // Project convention: subject is a UUID
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::MalformedClaims)?;

        Ok((user_id, claims))
    }
}

/// Extracts `<value>` from `Authorization: <scheme> <value>`.
///
/// Exactly two space-separated parts, scheme matched case-insensitively
/// against `bearer`, value non-empty.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingCredential)?
        .to_str()
        .map_err(|_| AppError::MalformedCredential)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(AppError::MalformedCredential),
    }
}

/// Guards every route of `router` with `gate`.
///
/// Uses `route_layer`, so unmatched paths still answer 404 rather than 401.
///
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.auth.clone());
/// ```
pub fn apply<S>(router: Router<S>, gate: AuthGate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<AuthGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (user_id, claims) = gate.authenticate(req.headers())?;

    // middleware → extractor への受け渡し
    RequestScope::attach(req.extensions_mut()).set_identity(user_id, claims);

    Ok(next.run(req).await)
}
