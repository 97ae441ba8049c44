use std::time::Duration;

use akiba_config::JwtConfig;
use akiba_models::Claims;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::errors::AuthError;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret must not be empty")]
    EmptySecret,
    #[error("token issuer must not be empty")]
    EmptyIssuer,
}

/// Issues and verifies HS256 access tokens bound to one issuer.
pub struct TokenService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if config.issuer.is_empty() {
            return Err(TokenError::EmptyIssuer);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        // Expiry and issued-at are checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;

        Ok(Self {
            issuer: config.issuer.clone(),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, ttl: Duration, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(|| AuthError::internal(anyhow::anyhow!("ttl of {:?} is out of range", ttl), "sign access token"))?;

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat,
            exp,
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(e, "sign access token"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Every failure is reported as the same `Unauthorized`; the reason is
    /// only visible in debug logs.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| reject(&e.to_string()))?
            .claims;

        let now = now.timestamp();
        if now >= claims.exp {
            return Err(reject("token expired"));
        }
        if claims.iat > now {
            return Err(reject("token issued in the future"));
        }
        if claims.sub.trim().is_empty() {
            return Err(reject("empty subject"));
        }

        Ok(claims)
    }
}

fn reject(reason: &str) -> AuthError {
    tracing::debug!(reason, "Rejected access token");
    AuthError::Unauthorized
}
