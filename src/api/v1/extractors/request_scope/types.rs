/*
 * Responsibility
 * - 1 リクエスト分の派生値 (identity / logger) を保持する型
 * - gate / instrumentation が書き込み、handler は accessor 経由でのみ読む
 *
 * Notes
 * - 各キーは OnceLock: 最初の書き込みが勝ち、以降の書き込みは無視される
 * - リクエストの extensions に Arc<RequestScope> として載り、リクエストと共に破棄される
 */
use std::sync::{Arc, OnceLock};

use axum::http::Extensions;
use tracing::Span;
use uuid::Uuid;

use crate::services::auth::access_jwt::Claims;

/// Per-request scope. Every reader is total: an unset key yields a fallback
/// value, never an error.
#[derive(Debug, Default)]
pub struct RequestScope {
    user_id: OnceLock<Uuid>,
    email: OnceLock<String>,
    name: OnceLock<String>,
    is_admin: OnceLock<bool>,
    claims: OnceLock<Claims>,
    logger: OnceLock<Span>,
}

impl RequestScope {
    /// Returns the scope attached to `extensions`, attaching a fresh one first
    /// if the request has none yet.
    pub fn attach(extensions: &mut Extensions) -> Arc<Self> {
        if let Some(scope) = extensions.get::<Arc<Self>>() {
            return Arc::clone(scope);
        }
        let scope = Arc::new(Self::default());
        extensions.insert(Arc::clone(&scope));
        scope
    }

    pub fn from_extensions(extensions: &Extensions) -> Option<&Arc<Self>> {
        extensions.get::<Arc<Self>>()
    }

    /// Writes the identity keys. Keys that are already set keep their value.
    pub fn set_identity(&self, user_id: Uuid, claims: Claims) {
        let _ = self.user_id.set(user_id);
        let _ = self.email.set(claims.email.clone());
        let _ = self.name.set(claims.name.clone());
        let _ = self.is_admin.set(claims.is_admin);
        let _ = self.claims.set(claims);
    }

    /// Returns `false` if a logger was already installed.
    pub fn set_logger(&self, logger: Span) -> bool {
        self.logger.set(logger).is_ok()
    }

    /// `Uuid::nil()` when unauthenticated.
    pub fn user_id(&self) -> Uuid {
        self.user_id.get().copied().unwrap_or_else(Uuid::nil)
    }

    pub fn email(&self) -> &str {
        self.email.get().map_or("", String::as_str)
    }

    pub fn name(&self) -> &str {
        self.name.get().map_or("", String::as_str)
    }

    /// Absence is treated exactly like `false`.
    pub fn is_admin(&self) -> bool {
        self.is_admin.get().copied().unwrap_or(false)
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.get()
    }

    /// The request logger, or the root span when none was installed.
    pub fn logger(&self) -> Span {
        self.logger.get().cloned().unwrap_or_else(Span::none)
    }

    /// Request logger enriched with the caller's identity.
    ///
    /// `user_id` is recorded only when it is not nil, `user_name` only when
    /// it is not empty.
    pub fn identity_logger(&self) -> Span {
        let base = self.logger();
        let span = tracing::info_span!(
            parent: &base,
            "identity",
            user_id = tracing::field::Empty,
            user_name = tracing::field::Empty,
        );

        let user_id = self.user_id();
        if !user_id.is_nil() {
            span.record("user_id", tracing::field::display(user_id));
        }
        let name = self.name();
        if !name.is_empty() {
            span.record("user_name", name);
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, EventCollector};

    #[test]
    fn empty_scope_falls_back() {
        let scope = RequestScope::default();

        assert!(scope.user_id().is_nil());
        assert_eq!(scope.email(), "");
        assert_eq!(scope.name(), "");
        assert!(!scope.is_admin());
        assert!(scope.claims().is_none());
        assert!(scope.logger().is_none());
    }

    #[test]
    fn identity_is_write_once() {
        let scope = RequestScope::default();
        let first = testutil::claims(false);
        let first_id = Uuid::parse_str(&first.sub).unwrap();
        scope.set_identity(first_id, first.clone());

        let mut second = testutil::claims(true);
        second.email = "mallory@example.com".into();
        scope.set_identity(Uuid::new_v4(), second);

        assert_eq!(scope.user_id(), first_id);
        assert_eq!(scope.email(), "ada@example.com");
        assert!(!scope.is_admin());
        assert_eq!(scope.claims(), Some(&first));
    }

    #[test]
    fn logger_is_write_once() {
        let (_collector, _guard) = EventCollector::install();
        let scope = RequestScope::default();

        assert!(scope.set_logger(tracing::info_span!("first")));
        assert!(!scope.set_logger(tracing::info_span!("second")));
        assert_eq!(scope.logger().metadata().map(|m| m.name()), Some("first"));
    }

    #[test]
    fn attach_reuses_existing_scope() {
        let mut extensions = Extensions::new();
        let a = RequestScope::attach(&mut extensions);
        let b = RequestScope::attach(&mut extensions);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(RequestScope::from_extensions(&extensions).is_some());
    }

    #[test]
    fn identity_logger_records_known_identity() {
        let (collector, _guard) = EventCollector::install();
        let scope = RequestScope::default();
        scope.set_logger(tracing::info_span!("request", request_id = "req-1"));
        let claims = testutil::claims(false);
        scope.set_identity(Uuid::parse_str(&claims.sub).unwrap(), claims);

        tracing::info!(parent: &scope.identity_logger(), "hello");

        let events = collector.events();
        assert_eq!(events.len(), 1);
        let fields = &events[0].span_fields;
        assert_eq!(fields.get("request_id").map(String::as_str), Some("req-1"));
        assert_eq!(fields.get("user_id").map(String::as_str), Some(testutil::USER_ID));
        assert_eq!(fields.get("user_name").map(String::as_str), Some("Ada"));
    }

    #[test]
    fn identity_logger_skips_unknown_identity() {
        let (collector, _guard) = EventCollector::install();
        let scope = RequestScope::default();
        scope.set_logger(tracing::info_span!("request", request_id = "req-2"));

        tracing::info!(parent: &scope.identity_logger(), "anonymous");

        let events = collector.events();
        assert_eq!(events.len(), 1);
        let fields = &events[0].span_fields;
        assert_eq!(fields.get("request_id").map(String::as_str), Some("req-2"));
        assert!(!fields.contains_key("user_id"));
        assert!(!fields.contains_key("user_name"));
    }
}
