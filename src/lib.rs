//! Request boundary layer: bearer-token authentication, privilege gating and
//! per-request instrumentation for axum services.
//!
//! - [`middleware::auth::access`] validates `Authorization: Bearer <token>` and
//!   installs the caller's identity into the [`RequestScope`].
//! - [`middleware::auth::admin`] admits only privileged identities.
//! - [`middleware::instrumentation`] installs a request logger and records one
//!   completion entry per request.
//! - [`Scope`] gives handlers total, typed access to the scope.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
mod testutil;

pub use api::v1::extractors::{RequestScope, Scope};
pub use error::AppError;
