use crate::domain_model::{KeyNamespace, PrincipalKey, SessionMode};
use crate::domain_port::{KeyStore, KeyStoreError, RefreshSessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Refresh sessions kept in the same key store as the token bindings.
///
/// `sid -> principal` marks a live refresh session. In single-token mode a
/// `principal -> sid` pointer is kept as well, so a new login or a logout can
/// find and drop the previous session.
pub struct StoreRefreshSessions {
    store: Arc<dyn KeyStore>,
    namespace: KeyNamespace,
    mode: SessionMode,
}

impl StoreRefreshSessions {
    pub fn new(store: Arc<dyn KeyStore>, namespace: KeyNamespace, mode: SessionMode) -> Self {
        Self {
            store,
            namespace,
            mode,
        }
    }

    /// Session entry plus the principal pointer, if that pointer names `sid`.
    async fn entries_for(&self, key: &PrincipalKey, sid: &str) -> Result<Vec<String>, KeyStoreError> {
        let mut entries = vec![self.namespace.refresh_session_entry(sid)];
        if self.mode == SessionMode::Single {
            let pointer = self.namespace.refresh_principal_entry(key);
            if self.store.get(&pointer).await?.as_deref() == Some(sid) {
                entries.push(pointer);
            }
        }
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl RefreshSessionStore for StoreRefreshSessions {
    async fn save_refresh_session(
        &self,
        key: &PrincipalKey,
        sid: &str,
        ttl: Duration,
    ) -> Result<(), KeyStoreError> {
        if self.mode == SessionMode::Single {
            let pointer = self.namespace.refresh_principal_entry(key);
            if let Some(old) = self.store.get(&pointer).await?.filter(|old| old != sid) {
                debug!(%key, "dropping previous refresh session");
                self.store
                    .delete_many(&[self.namespace.refresh_session_entry(&old)])
                    .await?;
            }
            self.store
                .set_with_ttl(&self.namespace.refresh_session_entry(sid), key.as_str(), ttl)
                .await?;
            self.store.set_with_ttl(&pointer, sid, ttl).await?;
        } else {
            self.store
                .set_with_ttl(&self.namespace.refresh_session_entry(sid), key.as_str(), ttl)
                .await?;
        }
        Ok(())
    }

    async fn check_refresh_session(
        &self,
        sid: &str,
        consume: bool,
    ) -> Result<Option<PrincipalKey>, KeyStoreError> {
        if sid.is_empty() {
            return Ok(None);
        }
        let Some(key) = self.store.get(&self.namespace.refresh_session_entry(sid)).await? else {
            return Ok(None);
        };
        let key = PrincipalKey(key);
        if consume {
            let entries = self.entries_for(&key, sid).await?;
            self.store.delete_many(&entries).await?;
        }
        Ok(Some(key))
    }

    async fn drop_refresh_session(&self, sid: &str) -> Result<(), KeyStoreError> {
        self.check_refresh_session(sid, true).await?;
        Ok(())
    }

    async fn drop_refresh_sessions_of(&self, key: &PrincipalKey) -> Result<(), KeyStoreError> {
        if self.mode == SessionMode::Multiple {
            return Ok(());
        }
        let pointer = self.namespace.refresh_principal_entry(key);
        if let Some(sid) = self.store.get(&pointer).await? {
            self.store
                .delete_many(&[pointer, self.namespace.refresh_session_entry(&sid)])
                .await?;
        }
        Ok(())
    }
}
