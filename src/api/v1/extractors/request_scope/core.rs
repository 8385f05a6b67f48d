use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::RequestScope;

/// Handler で RequestScope を受け取るための extractor
/// scope が無いリクエスト (middleware 未適用) でも失敗せず、空の scope を返す
/// 値の有無は accessor の fallback で吸収する
#[derive(Debug, Clone)]
pub struct Scope(pub Arc<RequestScope>);

impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Scope(
            RequestScope::from_extensions(&parts.extensions)
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn missing_scope_yields_empty_scope() {
        let (mut parts, _) = Request::new(()).into_parts();

        let Scope(scope) = Scope::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(scope.user_id().is_nil());
        assert!(!scope.is_admin());
    }

    #[tokio::test]
    async fn attached_scope_is_shared() {
        let mut req = Request::new(());
        let attached = RequestScope::attach(req.extensions_mut());
        let (mut parts, _) = req.into_parts();

        let Scope(scope) = Scope::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(Arc::ptr_eq(&attached, &scope));
    }
}
