use crate::application_port::{TokenManager, TokenManagerError, WriteOutcome};
use crate::domain_model::{KeyNamespace, PrincipalKey, SessionMode, SessionPolicy, SessionToken};
use crate::domain_port::KeyStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Binds tokens to principals through a shared expiring store.
///
/// In single-token mode two entries make up a binding: `principal -> token`
/// and `token -> principal`. In multi-token mode only the token-keyed entry
/// exists. The token-keyed entry is always written first and decides whether a
/// token is live. No operation spans a transaction; an entry left behind by a
/// partial failure expires with its TTL.
pub struct StoreTokenManager {
    store: Arc<dyn KeyStore>,
    policy: Arc<SessionPolicy>,
    namespace: KeyNamespace,
}

impl StoreTokenManager {
    pub fn new(store: Arc<dyn KeyStore>, policy: Arc<SessionPolicy>, namespace: KeyNamespace) -> Self {
        Self {
            store,
            policy,
            namespace,
        }
    }

    async fn read(&self, entry: &str) -> Result<Option<String>, TokenManagerError> {
        Ok(self.store.get(entry).await?)
    }

    async fn write(&self, entry: &str, value: &str, ttl: Duration) -> bool {
        match self.store.set_with_ttl(entry, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(entry, error = %e, "store write failed");
                false
            }
        }
    }

    async fn expire(&self, entry: &str, ttl: Duration) -> bool {
        match self.store.extend_ttl(entry, ttl).await {
            Ok(_) => true,
            Err(e) => {
                warn!(entry, error = %e, "store ttl update failed");
                false
            }
        }
    }

    async fn delete(&self, entries: Vec<String>) -> bool {
        match self.store.delete_many(&entries).await {
            Ok(_) => true,
            Err(e) => {
                warn!(?entries, error = %e, "store delete failed");
                false
            }
        }
    }

    /// Writes the token-keyed entry, then the principal-keyed one.
    async fn bind(&self, key: &PrincipalKey, token: &SessionToken, mut degraded: bool) -> WriteOutcome {
        let ttl = self.policy.token_ttl;
        if !self.write(&self.namespace.token_entry(token), key.as_str(), ttl).await {
            return WriteOutcome::Failed;
        }
        if self.policy.mode == SessionMode::Single {
            degraded |= !self
                .write(&self.namespace.principal_entry(key), token.as_str(), ttl)
                .await;
        }
        if degraded {
            WriteOutcome::Degraded
        } else {
            WriteOutcome::Applied
        }
    }

    async fn create_single_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError> {
        let previous = self.read(&self.namespace.principal_entry(key)).await?;
        let mut degraded = false;
        if let Some(old) = previous.filter(|old| old != token.as_str()) {
            debug!(%key, "revoking previous token");
            let old_entry = self.namespace.token_entry(&SessionToken(old));
            degraded |= !self.delete(vec![old_entry]).await;
        }
        Ok(self.bind(key, token, degraded).await)
    }

    async fn create_multiple_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError> {
        Ok(self.bind(key, token, false).await)
    }

    async fn del_single_relationship_by_key(
        &self,
        key: &PrincipalKey,
    ) -> Result<WriteOutcome, TokenManagerError> {
        let forward = self.namespace.principal_entry(key);
        let Some(token) = self.read(&forward).await? else {
            return Ok(WriteOutcome::Noop);
        };
        let reverse = self.namespace.token_entry(&SessionToken(token));
        if self.delete(vec![forward, reverse]).await {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Failed)
        }
    }

    async fn flush_expire_after_lookup(&self, key: &PrincipalKey, token: &SessionToken) {
        let ttl = self.policy.token_ttl;
        let reverse = self.namespace.token_entry(token);
        if self.policy.mode == SessionMode::Multiple {
            self.expire(&reverse, ttl).await;
            return;
        }

        let forward = self.namespace.principal_entry(key);
        match self.store.get(&forward).await {
            Ok(Some(current)) if current != token.as_str() => {
                // A replaced token inside its grace window keeps its short TTL.
                debug!(%key, "lookup on a superseded token, ttl left as is");
            }
            Ok(current) => {
                self.expire(&reverse, ttl).await;
                if current.is_some() {
                    self.expire(&forward, ttl).await;
                }
            }
            Err(e) => warn!(%key, error = %e, "could not read binding for ttl refresh"),
        }
    }
}

#[async_trait::async_trait]
impl TokenManager for StoreTokenManager {
    async fn create_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError> {
        if key.is_empty() || token.is_empty() {
            return Ok(WriteOutcome::Noop);
        }
        let outcome = match self.policy.mode {
            SessionMode::Single => self.create_single_relationship(key, token).await?,
            SessionMode::Multiple => self.create_multiple_relationship(key, token).await?,
        };
        debug!(%key, ?outcome, "relationship created");
        Ok(outcome)
    }

    async fn get_key(
        &self,
        token: &SessionToken,
    ) -> Result<Option<PrincipalKey>, TokenManagerError> {
        if token.is_empty() {
            return Ok(None);
        }
        let Some(key) = self.read(&self.namespace.token_entry(token)).await? else {
            return Ok(None);
        };
        let key = PrincipalKey(key);
        if self.policy.refresh_on_lookup {
            self.flush_expire_after_lookup(&key, token).await;
        }
        Ok(Some(key))
    }

    async fn del_relationship_by_key(
        &self,
        key: &PrincipalKey,
    ) -> Result<WriteOutcome, TokenManagerError> {
        if key.is_empty() {
            return Ok(WriteOutcome::Noop);
        }
        match self.policy.mode {
            SessionMode::Single => self.del_single_relationship_by_key(key).await,
            SessionMode::Multiple => {
                debug!(%key, "no principal entry in multi-token mode, nothing to delete");
                Ok(WriteOutcome::Noop)
            }
        }
    }

    async fn del_relationship_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError> {
        if token.is_empty() {
            return Ok(WriteOutcome::Noop);
        }
        let reverse = self.namespace.token_entry(token);
        let Some(key) = self.read(&reverse).await? else {
            return Ok(WriteOutcome::Noop);
        };
        let mut entries = vec![reverse];
        if self.policy.mode == SessionMode::Single {
            let forward = self.namespace.principal_entry(&PrincipalKey(key));
            // Only drop the principal entry if it still points at this token.
            if self.read(&forward).await?.as_deref() == Some(token.as_str()) {
                entries.push(forward);
            }
        }
        if self.delete(entries).await {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Failed)
        }
    }

    async fn refresh_relationship(
        &self,
        key: &PrincipalKey,
        token: &SessionToken,
    ) -> Result<WriteOutcome, TokenManagerError> {
        if key.is_empty() || token.is_empty() {
            return Ok(WriteOutcome::Noop);
        }
        let mut degraded = false;
        if self.policy.mode == SessionMode::Single {
            let previous = self.read(&self.namespace.principal_entry(key)).await?;
            if let Some(old) = previous.filter(|old| old != token.as_str()) {
                let old_entry = self.namespace.token_entry(&SessionToken(old));
                degraded |= !self.expire(&old_entry, self.policy.grace_ttl).await;
            }
        }
        let outcome = self.bind(key, token, degraded).await;
        debug!(%key, ?outcome, "relationship refreshed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::KeyStoreError;
    use crate::infra_memory::MemoryKeyStore;

    const TTL: Duration = Duration::from_secs(1800);

    fn policy(mode: SessionMode, refresh_on_lookup: bool) -> Arc<SessionPolicy> {
        let mut policy = SessionPolicy::new(mode, b"secret".to_vec());
        policy.token_ttl = TTL;
        policy.refresh_on_lookup = refresh_on_lookup;
        Arc::new(policy)
    }

    fn manager(store: Arc<dyn KeyStore>, mode: SessionMode) -> StoreTokenManager {
        StoreTokenManager::new(store, policy(mode, true), KeyNamespace::default())
    }

    fn key(s: &str) -> PrincipalKey {
        PrincipalKey::from(s)
    }

    fn tok(s: &str) -> SessionToken {
        SessionToken::from(s)
    }

    /// Wraps the memory store and fails writes to keys with a given prefix.
    struct FailingWrites {
        inner: MemoryKeyStore,
        prefix: &'static str,
    }

    #[async_trait::async_trait]
    impl KeyStore for FailingWrites {
        async fn get(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
            self.inner.get(key).await
        }

        async fn set_with_ttl(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), KeyStoreError> {
            if key.starts_with(self.prefix) {
                return Err(KeyStoreError::Unavailable("write refused".to_string()));
            }
            self.inner.set_with_ttl(key, value, ttl).await
        }

        async fn extend_ttl(&self, key: &str, ttl: Duration) -> Result<bool, KeyStoreError> {
            self.inner.extend_ttl(key, ttl).await
        }

        async fn delete_many(&self, keys: &[String]) -> Result<u64, KeyStoreError> {
            self.inner.delete_many(keys).await
        }
    }

    struct DownStore;

    #[async_trait::async_trait]
    impl KeyStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, KeyStoreError> {
            Err(KeyStoreError::Unavailable("connection refused".to_string()))
        }

        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> Result<(), KeyStoreError> {
            Err(KeyStoreError::Unavailable("connection refused".to_string()))
        }

        async fn extend_ttl(&self, _key: &str, _ttl: Duration) -> Result<bool, KeyStoreError> {
            Err(KeyStoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete_many(&self, _keys: &[String]) -> Result<u64, KeyStoreError> {
            Err(KeyStoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn single_mode_new_login_revokes_previous_token() {
        let tm = manager(Arc::new(MemoryKeyStore::new()), SessionMode::Single);

        assert_eq!(
            tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap(),
            WriteOutcome::Applied
        );
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), Some(key("alice")));

        tm.create_relationship(&key("alice"), &tok("tokB")).await.unwrap();
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), None);
        assert_eq!(tm.get_key(&tok("tokB")).await.unwrap(), Some(key("alice")));
    }

    #[tokio::test]
    async fn multi_mode_tokens_coexist_and_revoke_independently() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Multiple);

        tm.create_relationship(&key("bob"), &tok("t1")).await.unwrap();
        tm.create_relationship(&key("bob"), &tok("t2")).await.unwrap();
        assert_eq!(tm.get_key(&tok("t1")).await.unwrap(), Some(key("bob")));
        assert_eq!(tm.get_key(&tok("t2")).await.unwrap(), Some(key("bob")));
        assert_eq!(store.get("AUTHORIZATION_KEY_bob").await.unwrap(), None);

        assert_eq!(
            tm.del_relationship_by_token(&tok("t1")).await.unwrap(),
            WriteOutcome::Applied
        );
        assert_eq!(tm.get_key(&tok("t1")).await.unwrap(), None);
        assert_eq!(tm.get_key(&tok("t2")).await.unwrap(), Some(key("bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_without_refresh_leaves_ttl_alone() {
        let store = MemoryKeyStore::new();
        let tm = StoreTokenManager::new(
            Arc::new(store.clone()),
            policy(SessionMode::Single, false),
            KeyNamespace::default(),
        );
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        for _ in 0..3 {
            assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), Some(key("alice")));
        }

        let left = Duration::from_secs(1700);
        assert_eq!(store.remaining_ttl("AUTHORIZATION_TOKEN_tokA"), Some(left));
        assert_eq!(store.remaining_ttl("AUTHORIZATION_KEY_alice"), Some(left));
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_refreshes_both_sides_together() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Single);
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        tm.get_key(&tok("tokA")).await.unwrap();

        assert_eq!(store.remaining_ttl("AUTHORIZATION_TOKEN_tokA"), Some(TTL));
        assert_eq!(store.remaining_ttl("AUTHORIZATION_KEY_alice"), Some(TTL));
    }

    #[tokio::test(start_paused = true)]
    async fn bindings_lapse_with_store_ttl() {
        let tm = manager(Arc::new(MemoryKeyStore::new()), SessionMode::Multiple);
        tm.create_relationship(&key("bob"), &tok("t1")).await.unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_eq!(tm.get_key(&tok("t1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoking_by_token_clears_both_entries() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Single);
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();

        assert_eq!(
            tm.del_relationship_by_token(&tok("tokA")).await.unwrap(),
            WriteOutcome::Applied
        );
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), None);
        assert!(store.is_empty());
        assert_eq!(
            tm.del_relationship_by_token(&tok("tokA")).await.unwrap(),
            WriteOutcome::Noop
        );
    }

    #[tokio::test]
    async fn deleting_by_key_depends_on_mode() {
        let store = MemoryKeyStore::new();
        let single = manager(Arc::new(store.clone()), SessionMode::Single);
        single.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();
        assert_eq!(
            single.del_relationship_by_key(&key("alice")).await.unwrap(),
            WriteOutcome::Applied
        );
        assert!(store.is_empty());

        let multi = manager(Arc::new(store.clone()), SessionMode::Multiple);
        multi.create_relationship(&key("bob"), &tok("t1")).await.unwrap();
        assert_eq!(
            multi.del_relationship_by_key(&key("bob")).await.unwrap(),
            WriteOutcome::Noop
        );
        assert_eq!(multi.get_key(&tok("t1")).await.unwrap(), Some(key("bob")));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_keeps_replaced_token_for_grace_window() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Single);
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();

        assert_eq!(
            tm.refresh_relationship(&key("alice"), &tok("tokB")).await.unwrap(),
            WriteOutcome::Applied
        );
        let grace = Duration::from_secs(300);
        assert_eq!(store.remaining_ttl("AUTHORIZATION_TOKEN_tokA"), Some(grace));

        // In-flight requests on the old token still resolve without extending it.
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), Some(key("alice")));
        assert_eq!(
            store.remaining_ttl("AUTHORIZATION_TOKEN_tokA"),
            Some(Duration::from_secs(200))
        );

        tokio::time::advance(Duration::from_secs(201)).await;
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), None);
        assert_eq!(tm.get_key(&tok("tokB")).await.unwrap(), Some(key("alice")));
    }

    #[tokio::test(start_paused = true)]
    async fn refreshing_with_the_live_token_keeps_full_ttl() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Single);
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(
            tm.refresh_relationship(&key("alice"), &tok("tokA")).await.unwrap(),
            WriteOutcome::Applied
        );
        assert_eq!(store.remaining_ttl("AUTHORIZATION_TOKEN_tokA"), Some(TTL));
        assert_eq!(store.remaining_ttl("AUTHORIZATION_KEY_alice"), Some(TTL));
    }

    #[tokio::test(start_paused = true)]
    async fn multi_mode_refresh_only_adds_the_new_token() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Multiple);
        tm.create_relationship(&key("bob"), &tok("t1")).await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(
            tm.refresh_relationship(&key("bob"), &tok("t2")).await.unwrap(),
            WriteOutcome::Applied
        );

        assert_eq!(
            store.remaining_ttl("AUTHORIZATION_TOKEN_t1"),
            Some(Duration::from_secs(1700))
        );
        assert_eq!(store.remaining_ttl("AUTHORIZATION_TOKEN_t2"), Some(TTL));
        assert_eq!(store.get("AUTHORIZATION_KEY_bob").await.unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn revoking_superseded_token_keeps_current_binding() {
        let store = MemoryKeyStore::new();
        let tm = manager(Arc::new(store.clone()), SessionMode::Single);
        tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap();
        tm.refresh_relationship(&key("alice"), &tok("tokB")).await.unwrap();

        tm.del_relationship_by_token(&tok("tokA")).await.unwrap();
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), None);
        assert_eq!(
            store.get("AUTHORIZATION_KEY_alice").await.unwrap().as_deref(),
            Some("tokB")
        );
    }

    #[tokio::test]
    async fn failed_principal_write_degrades_but_binds() {
        let store = FailingWrites {
            inner: MemoryKeyStore::new(),
            prefix: "AUTHORIZATION_KEY_",
        };
        let tm = manager(Arc::new(store), SessionMode::Single);

        assert_eq!(
            tm.create_relationship(&key("alice"), &tok("tokA")).await.unwrap(),
            WriteOutcome::Degraded
        );
        assert_eq!(tm.get_key(&tok("tokA")).await.unwrap(), Some(key("alice")));
    }

    #[tokio::test]
    async fn failed_token_write_is_reported() {
        let store = FailingWrites {
            inner: MemoryKeyStore::new(),
            prefix: "AUTHORIZATION_TOKEN_",
        };
        let tm = manager(Arc::new(store), SessionMode::Multiple);

        let outcome = tm.create_relationship(&key("bob"), &tok("t1")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Failed);
        assert!(!outcome.succeeded());
        assert_eq!(tm.get_key(&tok("t1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_on_reads() {
        let tm = manager(Arc::new(DownStore), SessionMode::Single);

        assert!(matches!(
            tm.get_key(&tok("tokA")).await,
            Err(TokenManagerError::StoreUnavailable(_))
        ));
        assert!(matches!(
            tm.create_relationship(&key("alice"), &tok("tokA")).await,
            Err(TokenManagerError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn empty_inputs_never_reach_the_store() {
        let tm = manager(Arc::new(DownStore), SessionMode::Single);

        assert_eq!(tm.get_key(&tok("")).await.unwrap(), None);
        assert_eq!(
            tm.del_relationship_by_key(&key("")).await.unwrap(),
            WriteOutcome::Noop
        );
        assert_eq!(
            tm.create_relationship(&key(""), &tok("tokA")).await.unwrap(),
            WriteOutcome::Noop
        );
    }
}
