use crate::domain_model::{PrincipalKey, SessionToken};
use crate::domain_port::KeyStoreError;

/// Result of a write sequence against the store.
///
/// Write failures are reported here instead of being raised, so a failed
/// secondary write never aborts an otherwise successful operation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WriteOutcome {
    /// Every write landed.
    Applied,
    /// The token-keyed entry landed but a secondary write failed.
    Degraded,
    /// The primary write failed; nothing usable was stored.
    Failed,
    /// There was nothing to write.
    Noop,
}

impl WriteOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, WriteOutcome::Failed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenManagerError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<KeyStoreError> for TokenManagerError {
    fn from(err: KeyStoreError) -> Self {
        TokenManagerError::StoreUnavailable(err.to_string())
    }
}

/// Maintains the principal/token bindings kept in the key store.
#[async_trait::async_trait]
pub trait TokenManager: Send + Sync {
    async fn create_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError>;

    /// Principal bound to `token`, or `None` if the binding is gone.
    async fn get_key(&self, token: &SessionToken)
    -> Result<Option<PrincipalKey>, TokenManagerError>;

    async fn del_relationship_by_key(
        &self,
        key: &PrincipalKey,
    ) -> Result<WriteOutcome, TokenManagerError>;

    async fn del_relationship_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError>;

    /// Bind `token` to `key`, leaving a replaced token alive for the grace window.
    async fn refresh_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError>;
}
