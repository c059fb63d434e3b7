use std::path::Path;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::AuthConfig;

/// Decides whether an opaque access token grants access to the gateway.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> bool;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No verification key configured")]
    MissingKey,

    #[error("Failed to read verification key {path}: {source}")]
    KeyRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Unsupported verification key: expected an RSA, EC or Ed25519 public key in PEM form")]
    UnsupportedKey,

    #[error("Token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

/// Verifies signed JWT access tokens against a key loaded once at startup.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Prefer the certificate path; the shared secret is the fallback.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        if let Some(path) = &config.cert_path {
            return Self::from_pem_file(path, config.leeway_secs);
        }
        if let Some(secret) = &config.shared_secret {
            return Ok(Self::from_secret(secret.as_bytes(), config.leeway_secs));
        }
        Err(AuthError::MissingKey)
    }

    pub fn from_pem_file(path: &Path, leeway_secs: u64) -> Result<Self, AuthError> {
        let pem = std::fs::read(path).map_err(|source| AuthError::KeyRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem, leeway_secs)
    }

    pub fn from_pem(pem: &[u8], leeway_secs: u64) -> Result<Self, AuthError> {
        use Algorithm::*;

        let (key, algorithms) = if let Ok(key) = DecodingKey::from_rsa_pem(pem) {
            (key, vec![RS256, RS384, RS512, PS256, PS384, PS512])
        } else if let Ok(key) = DecodingKey::from_ec_pem(pem) {
            (key, vec![ES256, ES384])
        } else if let Ok(key) = DecodingKey::from_ed_pem(pem) {
            (key, vec![EdDSA])
        } else {
            return Err(AuthError::UnsupportedKey);
        };

        Ok(Self {
            key,
            validation: validation(algorithms, leeway_secs),
        })
    }

    pub fn from_secret(secret: &[u8], leeway_secs: u64) -> Self {
        use Algorithm::*;

        Self {
            key: DecodingKey::from_secret(secret),
            validation: validation(vec![HS256, HS384, HS512], leeway_secs),
        }
    }

    /// Decode and verify a token, returning its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(claims) => {
                debug!("Token accepted for subject {:?}", claims.sub);
                true
            }
            Err(e) => {
                debug!("Token validation failed: {}", e);
                false
            }
        }
    }
}

fn validation(algorithms: Vec<Algorithm>, leeway_secs: u64) -> Validation {
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms;
    validation.leeway = leeway_secs;
    validation.validate_aud = false;
    validation
}
