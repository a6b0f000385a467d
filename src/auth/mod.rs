//! Auth Module
//!
//! API key validation: the consumer of the credential cache. Keys are hashed
//! on arrival, looked up in the cache, and only on a miss resolved against
//! the authoritative [`CredentialSource`].

mod credential;
mod middleware;
mod source;
mod validator;

pub use credential::{
    hash_token, AuthContext, CachedCredential, Credential, ADMIN_SCOPE, API_KEY_PREFIX,
};
pub use middleware::{extract_api_key, require_admin_scope, require_api_key};
pub use source::{CredentialSource, InMemoryCredentialSource};
pub use validator::{CredentialValidator, ValidationError};
