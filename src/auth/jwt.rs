//! Token signing and verification.

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Signs and verifies bearer tokens with a server-held secret.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        // Tokens carry no exp claim, so spec-claim validation is disabled.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Produce a signed token asserting `user_id`.
    pub fn sign(&self, user_id: &Uuid) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to sign token")
    }

    /// Verify a token's signature and decode the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .context("Invalid token")?;

        debug!("Verified token for subject {}", decoded.claims.sub);

        Ok(decoded.claims)
    }
}
