//! Credential Source
//!
//! The authoritative store of API keys, consulted only on a cache miss.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::auth::Credential;

/// Authoritative lookup and administration of API keys.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Finds the credential whose stored digest equals `token_hash`.
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Credential>>;

    /// Marks credential `id` revoked. Returns whether it existed.
    async fn revoke(&self, id: &str) -> anyhow::Result<bool>;

    /// Removes every credential of `team_id`. Returns how many went.
    async fn remove_team(&self, team_id: &str) -> anyhow::Result<usize>;
}

// == In-Memory Source ==
/// Source backed by a map, for the demo binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryCredentialSource {
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemoryCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `credential` under its hashed token, without the plaintext.
    pub fn insert(&self, mut credential: Credential) {
        credential.token = None;
        self.credentials
            .write()
            .insert(credential.hashed_token.clone(), credential);
    }

    pub fn len(&self) -> usize {
        self.credentials.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.read().is_empty()
    }
}

#[async_trait]
impl CredentialSource for InMemoryCredentialSource {
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Credential>> {
        Ok(self.credentials.read().get(token_hash).cloned())
    }

    async fn revoke(&self, id: &str) -> anyhow::Result<bool> {
        let mut credentials = self.credentials.write();
        let mut found = false;
        for credential in credentials.values_mut().filter(|c| c.id == id) {
            credential.revoked = true;
            found = true;
        }
        Ok(found)
    }

    async fn remove_team(&self, team_id: &str) -> anyhow::Result<usize> {
        let mut credentials = self.credentials.write();
        let before = credentials.len();
        credentials.retain(|_, c| c.team_id != team_id);
        Ok(before - credentials.len())
    }
}
