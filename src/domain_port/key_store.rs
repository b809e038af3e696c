use std::time::Duration;

/// Expiring key-value storage holding both sides of every binding.
///
/// Each call is expected to be atomic on its own; no cross-key transaction is
/// assumed by callers.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError>;
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration)
    -> Result<(), KeyStoreError>;
    /// Reset the TTL of an existing entry. Returns false if the key is absent.
    async fn extend_ttl(&self, key: &str, ttl: Duration) -> Result<bool, KeyStoreError>;
    /// Delete every listed key, returning how many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64, KeyStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
