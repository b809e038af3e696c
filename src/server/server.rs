use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;
use std::time::Duration;

const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Wires the key store, codec and managers selected by the settings.
pub struct Server {
    pub session_service: Arc<dyn SessionService>,
    pub token_manager: Arc<dyn TokenManager>,
    pub token_codec: Arc<dyn TokenCodec>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let policy = Arc::new(settings.session.policy()?);
        let namespace = settings.store.namespace()?;
        debug!(?policy, ?namespace);

        let key_store: Arc<dyn KeyStore> = match settings.store.backend.as_str() {
            "memory" => {
                let store = MemoryKeyStore::new();
                store.spawn_sweeper(MEMORY_SWEEP_INTERVAL);
                Arc::new(store)
            }
            "redis" => {
                let url = settings
                    .store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_url is required for redis"))?;
                Arc::new(RedisKeyStore::connect(url).await?)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(policy.clone()));
        let token_manager: Arc<dyn TokenManager> = Arc::new(StoreTokenManager::new(
            key_store.clone(),
            policy.clone(),
            namespace.clone(),
        ));
        let refresh_sessions: Arc<dyn RefreshSessionStore> = Arc::new(StoreRefreshSessions::new(
            key_store,
            namespace,
            policy.mode,
        ));
        let session_service: Arc<dyn SessionService> = Arc::new(RealSessionService::new(
            token_codec.clone(),
            token_manager.clone(),
            refresh_sessions,
            policy.clone(),
        ));

        info!(mode = ?policy.mode, backend = %settings.store.backend, "token services ready");

        Ok(Self {
            session_service,
            token_manager,
            token_codec,
        })
    }
}
