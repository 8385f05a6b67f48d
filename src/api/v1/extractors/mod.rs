pub mod request_scope;

pub use request_scope::{RequestScope, Scope};
