/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, 検証鍵, token lifetime policy など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::access_jwt::{AccessTokenPolicy, VerificationKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub verification_key: VerificationKey,
    pub access_token_policy: AccessTokenPolicy,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&var, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        // The shared secret wins when both are configured.
        let verification_key = match (var("AUTH_JWT_SECRET"), var("ACCESS_JWT_PUBLIC_KEY_PEM")) {
            (Some(secret), _) if !secret.is_empty() => VerificationKey::Secret(secret.into_bytes()),
            (_, Some(pem)) if !pem.is_empty() => {
                VerificationKey::Ed25519Pem(pem.replace("\\n", "\n"))
            }
            _ => return Err(ConfigError::Missing("AUTH_JWT_SECRET")),
        };

        let access_token_policy = AccessTokenPolicy {
            issuer: var("AUTH_ISSUER").filter(|s| !s.is_empty()),
            audience: var("AUTH_AUDIENCE").filter(|s| !s.is_empty()),
            max_lifetime_seconds: Some(parse_or(&var, "ACCESS_TOKEN_TTL_SECONDS", 900)?),
            leeway_seconds: parse_or(&var, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?,
        };

        let request_timeout_seconds = parse_or(&var, "REQUEST_TIMEOUT_SECONDS", 30)?;
        let request_body_limit_bytes = parse_or(&var, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;

        Ok(Self {
            addr,
            app_env,
            verification_key,
            access_token_policy,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
