use std::collections::HashMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Decides whether a username/password pair may be exchanged for a token.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError>;
}

/// Credentials configured under `auth.users`, stored as SHA-256 hex digests.
///
/// Digests are unsalted, so this is meant for development and small
/// deployments; production should plug a real identity store into
/// [`CredentialVerifier`].
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        let users = users
            .into_iter()
            .map(|(name, digest)| (name, digest.to_ascii_lowercase()))
            .collect();
        Self { users }
    }

    pub fn digest(password: &str) -> String {
        format!("{:x}", Sha256::digest(password.as_bytes()))
    }
}

fn digest_eq(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        // keep timing independent of where the length check fails
        let _ = expected.ct_eq(expected);
        return false;
    }
    expected.ct_eq(provided).into()
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError> {
        Ok(self
            .users
            .get(username)
            .is_some_and(|expected| digest_eq(expected, &Self::digest(password))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> StaticCredentials {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), StaticCredentials::digest("password123"));
        StaticCredentials::new(users)
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        assert_eq!(
            StaticCredentials::digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_verify_known_user() {
        let creds = credentials();
        assert!(creds.verify("alice", "password123").await.unwrap());
        assert!(!creds.verify("alice", "wrong").await.unwrap());
        assert!(!creds.verify("bob", "password123").await.unwrap());
    }

    #[test]
    fn test_digest_eq() {
        let digest = StaticCredentials::digest("pw");
        assert!(digest_eq(&digest, &digest));
        assert!(!digest_eq(&digest, &StaticCredentials::digest("other")));
        assert!(!digest_eq(&digest, &digest[..10]));
        assert!(!digest_eq("", &digest));
    }

    #[tokio::test]
    async fn test_truncated_stored_digest_rejected() {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), StaticCredentials::digest("pw")[..32].to_string());
        let creds = StaticCredentials::new(users);
        assert!(!creds.verify("alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_uppercase_digest_accepted() {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), StaticCredentials::digest("pw").to_uppercase());
        let creds = StaticCredentials::new(users);
        assert!(creds.verify("alice", "pw").await.unwrap());
    }
}
