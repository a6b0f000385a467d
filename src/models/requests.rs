//! Request DTOs for the admission API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::auth::API_KEY_PREFIX;

/// Request body for key verification (POST /auth/verify)
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// The plaintext API key to check
    pub api_key: String,
}

impl VerifyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Some("API key cannot be empty".to_string());
        }
        if !key.starts_with(API_KEY_PREFIX) {
            return Some(format!("API key must start with '{}'", API_KEY_PREFIX));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_request_deserialize() {
        let json = r#"{"api_key": "kg_api_abc"}"#;
        let req: VerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.api_key, "kg_api_abc");
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = VerifyRequest {
            api_key: "   ".to_string(),
        };
        assert!(req.validate().unwrap().contains("empty"));
    }

    #[test]
    fn test_validate_wrong_prefix() {
        let req = VerifyRequest {
            api_key: "sk_live_123".to_string(),
        };
        assert!(req.validate().unwrap().contains(API_KEY_PREFIX));
    }
}
