/*!
 * Request scope extractor
 *
 * Responsibility:
 * - gate / instrumentation が書き込んだ派生値 (identity / logger) を handler に提供する
 * - 型定義は types、axum 依存の extractor は core に分離する
 *
 * Public API:
 * - RequestScope
 * - Scope
 */

mod core;
mod types;

pub use self::core::Scope;
pub use self::types::RequestScope;
