/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: AuthGate / AdminGate
 * - instrumentation: request span + 完了ログ
 * - http: request id / timeout / body limit / panic などの横断的な layer 群
 */
pub mod auth;
pub mod http;
pub mod instrumentation;
