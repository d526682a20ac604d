//! Signed access tokens delivered in the token cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::TokenConfig;
use crate::models::Role;
use crate::services::auth_service::AuthError;

/// Configured lifetimes are capped at ten years.
const MAX_EXPIRY_MINUTES: u64 = 10 * 365 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User identity
    pub sub: String,

    pub role: Role,

    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Option<Duration>,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &str, expiry: Option<Duration>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        }
    }

    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        let expiry = (config.expiry_minutes > 0).then(|| {
            let minutes = config.expiry_minutes.min(MAX_EXPIRY_MINUTES);
            Duration::minutes(i64::try_from(minutes).unwrap_or_default())
        });
        Self::new(&config.secret_key, expiry)
    }

    #[must_use]
    pub const fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: self.expiry.map(|ttl| (now + ttl).timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.expiry.is_none() {
            validation.validate_exp = false;
            validation.required_spec_claims.remove("exp");
        }

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::Token("Token has expired".to_string())
                }
                _ => AuthError::Token(format!("Invalid token: {e}")),
            })
    }
}
