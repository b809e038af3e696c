use crate::domain_port::{KeyStore, KeyStoreError};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

pub struct RedisKeyStore {
    conn: ConnectionManager,
}

impl RedisKeyStore {
    pub fn new(conn: ConnectionManager) -> Self {
        RedisKeyStore { conn }
    }

    pub async fn connect(url: &str) -> Result<Self, KeyStoreError> {
        let client = redis::Client::open(url).map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(Self::new(conn))
    }

    // Redis TTLs are whole seconds and a zero TTL is rejected.
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

#[async_trait::async_trait]
impl KeyStore for RedisKeyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(val)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), KeyStoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, value, Self::ttl_secs(ttl))
            .await
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn extend_ttl(&self, key: &str, ttl: Duration) -> Result<bool, KeyStoreError> {
        let mut conn = self.conn.clone();
        let applied: bool = conn
            .expire(key, Self::ttl_secs(ttl) as i64)
            .await
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(applied)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, KeyStoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .del(keys.to_vec())
            .await
            .map_err(|e| KeyStoreError::Unavailable(e.to_string()))?;
        Ok(removed)
    }
}
