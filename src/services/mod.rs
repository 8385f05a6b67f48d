/*
 * Responsibility
 * - ドメイン外の技術的サービス (token 検証など)
 * - middleware / handler はこの層の trait にだけ依存する
 */
pub mod auth;
