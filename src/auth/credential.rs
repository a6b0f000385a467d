//! Credential Records
//!
//! The full API key record as held by the authoritative source, and the
//! sanitized projection that is allowed into the cache.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Prefix every issued API key carries.
pub const API_KEY_PREFIX: &str = "kg_api_";

/// Scope granting access to the admin surface.
pub const ADMIN_SCOPE: &str = "admin:system";

// == Credential ==
/// API key record as returned by a [`CredentialSource`](super::CredentialSource).
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub name: String,
    /// Plaintext key, only present right after issuance
    pub token: Option<String>,
    /// Digest of the plaintext key as stored by the source
    pub hashed_token: String,
    pub scopes: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// Builds the record for a freshly issued `token`, valid for `valid_for`.
    pub fn issue(
        id: impl Into<String>,
        team_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        token: &str,
        scopes: Vec<String>,
        valid_for: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            team_id: team_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            token: Some(token.to_string()),
            hashed_token: hash_token(token),
            scopes,
            expires_at: now + valid_for,
            revoked: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// == Cached Credential ==
/// Non-secret view of a [`Credential`].
///
/// Carries no token material of any kind, so nothing secret can reach the
/// cache through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedCredential {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub name: String,
    pub scopes: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CachedCredential {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl From<&Credential> for CachedCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id.clone(),
            team_id: credential.team_id.clone(),
            user_id: credential.user_id.clone(),
            name: credential.name.clone(),
            scopes: credential.scopes.clone(),
            expires_at: credential.expires_at,
            created_at: credential.created_at,
        }
    }
}

// == Auth Context ==
/// Identity of the caller, placed in request extensions once a key validates.
///
/// Rate-limit key generators read user and team ids from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub team_id: String,
    pub credential_id: String,
}

impl From<&CachedCredential> for AuthContext {
    fn from(credential: &CachedCredential) -> Self {
        Self {
            user_id: credential.user_id.clone(),
            team_id: credential.team_id.clone(),
            credential_id: credential.id.clone(),
        }
    }
}

/// Hex SHA-256 digest of a presented key, used as the cache key.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
