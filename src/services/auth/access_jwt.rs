//! Access-token verification.
//!
//! The middleware only depends on [`TokenValidator`]; [`JwtValidator`] is the
//! `jsonwebtoken`-backed implementation wired up by the binary. Validation is
//! CPU-only (no I/O), so callers never need a timeout around it.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Outcome of a failed token validation.
///
/// Expiry is kept apart from every other failure so clients can tell
/// "refresh" from "re-authenticate".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Errors raised while building a validator from key material.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("invalid ed25519 public key pem: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
}

/// Identity asserted by a validated access token.
///
/// `sub` is kept as the raw string; the gate decides whether it is a
/// well-formed UUID. A missing or non-string subject decodes as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "lenient_subject")]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "admin")]
    pub is_admin: bool,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

fn lenient_subject<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(sub) => Ok(sub),
        _ => Ok(String::new()),
    }
}

/// Capability consumed by the auth gate.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<Claims, TokenError>;
}

/// Key used to check token signatures.
#[derive(Clone)]
pub enum VerificationKey {
    /// HS256 shared secret.
    Secret(Vec<u8>),
    /// EdDSA (Ed25519) public key, PEM encoded.
    Ed25519Pem(String),
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Secret(_) => f.write_str("VerificationKey::Secret(..)"),
            Self::Ed25519Pem(_) => f.write_str("VerificationKey::Ed25519Pem(..)"),
        }
    }
}

/// Access-token lifetime policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenPolicy {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Upper bound for `exp - iat`. `None` disables the check.
    pub max_lifetime_seconds: Option<u64>,
    /// Allowed clock skew, applied to `exp` and `iat`.
    pub leeway_seconds: u64,
}

impl Default for AccessTokenPolicy {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            max_lifetime_seconds: Some(900),
            leeway_seconds: 60,
        }
    }
}

/// `jsonwebtoken`-backed [`TokenValidator`].
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    policy: AccessTokenPolicy,
}

impl fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtValidator")
            .field("validation", &self.validation)
            .field("policy", &self.policy)
            .finish()
    }
}

impl JwtValidator {
    pub fn new(key: &VerificationKey, policy: AccessTokenPolicy) -> Result<Self, AccessJwtError> {
        let (decoding_key, algorithm) = match key {
            VerificationKey::Secret(secret) => (DecodingKey::from_secret(secret), Algorithm::HS256),
            VerificationKey::Ed25519Pem(pem) => (
                DecodingKey::from_ed_pem(pem.as_bytes()).map_err(AccessJwtError::InvalidKey)?,
                Algorithm::EdDSA,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = policy.leeway_seconds;
        if let Some(issuer) = &policy.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &policy.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
            policy,
        })
    }

    pub fn policy(&self) -> &AccessTokenPolicy {
        &self.policy
    }

    // `iat` is optional; when present it must not be in the future and the
    // token must not outlive the configured lifetime.
    fn check_lifetime(&self, claims: &Claims) -> Result<(), TokenError> {
        let Some(iat) = claims.iat else {
            return Ok(());
        };

        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let leeway = self.policy.leeway_seconds;

        if iat > now.saturating_add(leeway) {
            return Err(TokenError::Invalid);
        }
        if let Some(max) = self.policy.max_lifetime_seconds {
            if claims.exp.saturating_sub(iat) > max.saturating_add(leeway) {
                return Err(TokenError::Invalid);
            }
        }
        Ok(())
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        // Signature is verified before `exp`, so only authentic tokens can be
        // reported as expired.
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        self.check_lifetime(&data.claims)?;
        Ok(data.claims)
    }
}
