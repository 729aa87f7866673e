//! HS256 bearer tokens carrying the caller's account id and role.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::{ApplicantId, Role};

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: ApplicantId,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be signed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0} minutes is out of range")]
    Lifetime(i64),
}

/// Signs and verifies access tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: SecretString,
    ttl_mins: i64,
}

impl TokenIssuer {
    pub fn new(secret: SecretString, ttl_mins: i64) -> Self {
        Self { secret, ttl_mins }
    }

    pub fn issue(&self, subject: ApplicantId, role: Role) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let exp = self
            .ttl_mins
            .checked_mul(60)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(TokenError::Lifetime(self.ttl_mins))?;
        let claims = Claims {
            sub: subject,
            role,
            exp,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        self.encode(&claims).map(|access_token| IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_at: claims.exp,
        })
    }

    /// Validates signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(TokenError::Invalid)
    }

    pub(crate) fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(TokenError::Signing)
    }
}
