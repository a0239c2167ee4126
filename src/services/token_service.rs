use std::sync::Arc;

use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::database::{CredentialStore, StoreError};

/// Secret name under which the shared n8n bearer token is kept
pub const N8N_TOKEN_NAME: &str = "N8N_AUTH_TOKEN";

/// Returned by [`TokenService::current_token`] when no token was ever
/// issued. Anyone can guess it; rotate before exposing the callback route.
pub const DEFAULT_INSECURE_TOKEN: &str = "n8n-default-insecure-token";

const TOKEN_PREFIX: &str = "n8n_";
const RANDOM_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to read n8n token: {0}")]
    Lookup(#[source] StoreError),

    #[error("Failed to persist new n8n token: {0}")]
    Issuance(#[source] StoreError),
}

/// Reads and rotates the bearer token shared with n8n
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn CredentialStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// The stored token, or [`DEFAULT_INSECURE_TOKEN`] if none exists yet
    pub async fn current_token(&self) -> Result<String, TokenError> {
        match self.store.get(N8N_TOKEN_NAME).await.map_err(TokenError::Lookup)? {
            Some(secret) => Ok(secret.value),
            None => {
                warn!("No {} stored; falling back to the default insecure token", N8N_TOKEN_NAME);
                Ok(DEFAULT_INSECURE_TOKEN.to_string())
            }
        }
    }

    /// Generate, persist and return a new token. The value is only returned
    /// once the upsert has succeeded.
    pub async fn issue_new_token(&self) -> Result<String, TokenError> {
        let token = generate_token();

        self.store
            .upsert(N8N_TOKEN_NAME, &token)
            .await
            .map_err(TokenError::Issuance)?;

        info!(fingerprint = %fingerprint(&token), "Rotated {}", N8N_TOKEN_NAME);
        Ok(token)
    }

    /// Constant-time-ish comparison against the current token
    pub async fn verify(&self, presented: &str) -> Result<bool, TokenError> {
        let current = self.current_token().await?;
        let (a, b) = (current.as_bytes(), presented.as_bytes());
        if a.len() != b.len() {
            return Ok(false);
        }
        Ok(a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0)
    }
}

/// `n8n_<32 alphanumerics>_<base36 unix millis>`
fn generate_token() -> String {
    let random: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();
    let millis = Utc::now().timestamp_millis().max(0) as u64;

    format!("{}{}_{}", TOKEN_PREFIX, random, to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Short SHA-256 prefix, safe to log in place of a token
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..12].to_string()
}
