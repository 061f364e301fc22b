//! services/api/src/web/token.rs
//!
//! Issues and verifies the signed bearer tokens handed out at login.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use job_tracker_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub const TOKEN_FAILED: &str = "Not authorized, token failed";

/// JWT claims carried by every bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

/// HS256 token issuer and verifier bound to one secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], expires_in: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced to the second.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expires_in,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> PortResult<String> {
        self.encode(&Claims::new(user_id, self.expires_in))
    }

    pub fn encode(&self, claims: &Claims) -> PortResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    /// Returns the subject of a valid, unexpired token. Expired, tampered and
    /// malformed tokens are all rejected the same way.
    pub fn verify(&self, token: &str) -> PortResult<Uuid> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                PortError::Unauthorized(TOKEN_FAILED.to_string())
            })?;

        Uuid::parse_str(&claims.sub).map_err(|_| PortError::Unauthorized(TOKEN_FAILED.to_string()))
    }
}
