//! Credential Validator
//!
//! Validates presented API keys, consulting the credential cache first and
//! the authoritative source only on a miss.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::auth::{hash_token, CachedCredential, CredentialSource, API_KEY_PREFIX};
use crate::cache::CredentialCache;
use crate::error::AdmissionError;

/// Why a presented key was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Invalid API key")]
    Unknown,

    #[error("API key expired")]
    Expired,

    #[error("API key revoked")]
    Revoked,

    /// The source could not be queried; the request is refused, nothing is cached
    #[error("Validation failed")]
    SourceUnavailable,
}

impl From<ValidationError> for AdmissionError {
    fn from(err: ValidationError) -> Self {
        AdmissionError::Unauthorized(err.to_string())
    }
}

pub struct CredentialValidator {
    cache: Arc<CredentialCache>,
    source: Arc<dyn CredentialSource>,
}

impl CredentialValidator {
    pub fn new(cache: Arc<CredentialCache>, source: Arc<dyn CredentialSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &Arc<CredentialCache> {
        &self.cache
    }

    // == Validate ==
    /// Returns the sanitized credential for `token` if it is valid.
    pub async fn validate(&self, token: &str) -> Result<CachedCredential, ValidationError> {
        if !token.starts_with(API_KEY_PREFIX) {
            return Err(ValidationError::InvalidFormat);
        }

        let token_hash = hash_token(token);

        if let Some(cached) = self.cache.get(&token_hash) {
            if cached.is_expired(Utc::now()) {
                self.cache.delete(&token_hash);
                return Err(ValidationError::Expired);
            }
            debug!(credential_id = %cached.id, "API key served from cache");
            return Ok(cached);
        }

        // A revoke landing while the source is queried must not be undone
        // by caching what the source returned before it.
        let generation = self.cache.generation();

        let credential = self
            .source
            .find_by_token_hash(&token_hash)
            .await
            .map_err(|err| {
                error!("API key validation error: {:#}", err);
                ValidationError::SourceUnavailable
            })?
            .ok_or(ValidationError::Unknown)?;

        if credential.is_expired(Utc::now()) {
            return Err(ValidationError::Expired);
        }
        if credential.revoked {
            return Err(ValidationError::Revoked);
        }

        let cached = CachedCredential::from(&credential);
        self.cache
            .set_if_generation(token_hash, cached.clone(), generation);
        debug!(credential_id = %cached.id, "API key validated against source");

        Ok(cached)
    }

    // == Invalidation ==
    /// Revokes credential `id` at the source and drops it from the cache.
    pub async fn revoke(&self, id: &str) -> anyhow::Result<bool> {
        let found = self.source.revoke(id).await?;
        let evicted = self.cache.delete_by_credential_id(id);
        info!(credential_id = %id, found, evicted, "API key revoked");
        Ok(found)
    }

    /// Removes every credential of `team_id` at the source and from the cache.
    pub async fn remove_team(&self, team_id: &str) -> anyhow::Result<usize> {
        let removed = self.source.remove_team(team_id).await?;
        let evicted = self.cache.delete_by_team_id(team_id);
        info!(team_id = %team_id, removed, evicted, "Team credentials removed");
        Ok(removed)
    }
}
