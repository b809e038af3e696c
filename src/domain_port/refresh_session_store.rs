use crate::domain_model::PrincipalKey;
use crate::domain_port::KeyStoreError;
use std::time::Duration;

/// Server-side record of refresh sessions, so refresh tokens can be revoked.
#[async_trait::async_trait]
pub trait RefreshSessionStore: Send + Sync {
    /// Save a refresh session id for a principal with TTL.
    async fn save_refresh_session(
        &self,
        key: &PrincipalKey,
        sid: &str,
        ttl: Duration,
    ) -> Result<(), KeyStoreError>;
    /// Principal owning `sid`, if still live. If live and consume=true, delete it (rotation).
    async fn check_refresh_session(
        &self,
        sid: &str,
        consume: bool,
    ) -> Result<Option<PrincipalKey>, KeyStoreError>;
    async fn drop_refresh_session(&self, sid: &str) -> Result<(), KeyStoreError>;
    /// Drop the principal's current refresh session. Only tracked in single-token mode.
    async fn drop_refresh_sessions_of(&self, key: &PrincipalKey) -> Result<(), KeyStoreError>;
}
