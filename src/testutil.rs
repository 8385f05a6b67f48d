//! Shared test helpers: token minting and log capture.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

use crate::config::Config;
use crate::services::auth::access_jwt::Claims;

pub(crate) const TEST_SECRET: &[u8] = b"test-secret-0123456789abcdef";
pub(crate) const USER_ID: &str = "8d4a2a0e-3b2c-4c8e-9f1a-2b3c4d5e6f70";

pub(crate) fn now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap()
}

pub(crate) fn claims(is_admin: bool) -> Claims {
    let now = now();
    Claims {
        sub: USER_ID.to_string(),
        email: "ada@example.com".to_string(),
        name: "Ada".to_string(),
        is_admin,
        exp: now + 300,
        iat: Some(now),
        iss: None,
        jti: None,
    }
}

/// Config with every default and the test secret.
pub(crate) fn config() -> Config {
    Config::from_vars(|key| match key {
        "AUTH_JWT_SECRET" => Some(String::from_utf8_lossy(TEST_SECRET).into_owned()),
        _ => None,
    })
    .unwrap()
}

pub(crate) fn sign(claims: &Claims) -> String {
    sign_with(claims, TEST_SECRET)
}

pub(crate) fn sign_with<T: Serialize>(claims: &T, secret: &[u8]) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

pub(crate) fn sign_value(claims: &serde_json::Value) -> String {
    sign_with(claims, TEST_SECRET)
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

/// One captured event: its own fields plus the fields of every enclosing span.
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedEvent {
    pub level: String,
    pub message: String,
    pub fields: HashMap<String, String>,
    pub span_fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub(crate) struct EventCollector {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCollector {
    /// Installs a collector as the thread's default subscriber.
    pub(crate) fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let collector = Self::default();
        let subscriber = tracing_subscriber::registry().with(collector.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (collector, guard)
    }

    pub(crate) fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub(crate) fn completions(&self) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.message == "request completed")
            .collect()
    }
}

struct SpanFields(HashMap<String, String>);

#[derive(Default)]
struct FieldVisitor(HashMap<String, String>);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(visitor.0));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = FieldVisitor(std::mem::take(&mut fields.0));
            values.record(&mut visitor);
            fields.0 = visitor.0;
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;
        let message = fields.remove("message").unwrap_or_default();

        let mut span_fields = HashMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(f) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(f.0.clone());
                }
            }
        }

        self.events.lock().expect("lock poisoned").push(CapturedEvent {
            level: event.metadata().level().to_string(),
            message,
            fields,
            span_fields,
        });
    }
}
