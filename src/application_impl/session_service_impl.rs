use crate::application_port::{
    IssuedSession, RenewedSession, SessionError, SessionService, TokenCodec, TokenManager,
    WriteOutcome,
};
use crate::domain_model::{
    PrincipalKey, REFRESH_TOKEN_TYPE, SESSION_ID_CLAIM, SessionPolicy, SessionToken,
    TOKEN_TYPE_CLAIM,
};
use crate::domain_port::RefreshSessionStore;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

struct TokenPair {
    sid: String,
    access_token: SessionToken,
    access_exp: Option<DateTime<Utc>>,
    refresh_token: SessionToken,
    refresh_exp: Option<DateTime<Utc>>,
}

pub struct RealSessionService {
    token_codec: Arc<dyn TokenCodec>,
    token_manager: Arc<dyn TokenManager>,
    refresh_sessions: Arc<dyn RefreshSessionStore>,
    policy: Arc<SessionPolicy>,
}

impl RealSessionService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_manager: Arc<dyn TokenManager>,
        refresh_sessions: Arc<dyn RefreshSessionStore>,
        policy: Arc<SessionPolicy>,
    ) -> Self {
        Self {
            token_codec,
            token_manager,
            refresh_sessions,
            policy,
        }
    }

    fn ensure_written(outcome: WriteOutcome) -> Result<(), SessionError> {
        if outcome.succeeded() {
            Ok(())
        } else {
            Err(SessionError::Store("session binding was not written".to_string()))
        }
    }

    #[inline]
    fn new_sid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Access and refresh token sharing a fresh session id.
    async fn issue_pair(
        &self,
        key: &PrincipalKey,
        mut claims: Map<String, Value>,
    ) -> Result<TokenPair, SessionError> {
        let sid = Self::new_sid();
        claims.remove(TOKEN_TYPE_CLAIM);
        claims.insert(SESSION_ID_CLAIM.to_string(), Value::String(sid.clone()));

        let (access_token, access_exp) = self
            .token_codec
            .issue(key.as_str(), claims.clone(), Some(self.policy.token_ttl))
            .await?;

        claims.insert(
            TOKEN_TYPE_CLAIM.to_string(),
            Value::String(REFRESH_TOKEN_TYPE.to_string()),
        );
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue(key.as_str(), claims, Some(self.policy.refresh_token_ttl))
            .await?;

        Ok(TokenPair {
            sid,
            access_token,
            access_exp,
            refresh_token,
            refresh_exp,
        })
    }
}

#[async_trait::async_trait]
impl SessionService for RealSessionService {
    async fn login(
        &self,
        key: PrincipalKey,
        claims: Map<String, Value>,
    ) -> Result<IssuedSession, SessionError> {
        if key.is_empty() {
            return Err(SessionError::InternalError("empty principal key".to_string()));
        }
        let pair = self.issue_pair(&key, claims).await?;

        let outcome = self
            .token_manager
            .create_relationship(&key, &pair.access_token)
            .await?;
        Self::ensure_written(outcome)?;
        self.refresh_sessions
            .save_refresh_session(&key, &pair.sid, self.policy.refresh_token_ttl)
            .await?;
        info!(%key, ?outcome, "session opened");

        Ok(IssuedSession {
            principal: key,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_token_expires_at: pair.access_exp,
            refresh_token_expires_at: pair.refresh_exp,
        })
    }

    async fn authenticate(&self, access_token: &SessionToken) -> Result<PrincipalKey, SessionError> {
        let claims = self
            .token_codec
            .verify(access_token)
            .await
            .ok_or(SessionError::Unauthenticated)?;
        if claims.is_refresh() {
            return Err(SessionError::Unauthenticated);
        }

        let key = self
            .token_manager
            .get_key(access_token)
            .await?
            .ok_or(SessionError::Unauthenticated)?;
        if key.as_str() != claims.sub {
            warn!(%key, subject = %claims.sub, "token subject does not match its binding");
            return Err(SessionError::Unauthenticated);
        }
        Ok(key)
    }

    async fn logout(&self, key: &PrincipalKey) -> Result<(), SessionError> {
        let outcome = self.token_manager.del_relationship_by_key(key).await?;
        self.refresh_sessions.drop_refresh_sessions_of(key).await?;
        Self::ensure_written(outcome)?;
        info!(%key, ?outcome, "session closed");
        Ok(())
    }

    async fn revoke(&self, access_token: &SessionToken) -> Result<(), SessionError> {
        // An expired token still names the refresh session to drop.
        let sid = self
            .token_codec
            .inspect_signed(access_token)
            .await
            .ok()
            .and_then(|claims| claims.session_id().map(str::to_string));

        let outcome = self
            .token_manager
            .del_relationship_by_token(access_token)
            .await?;
        if let Some(sid) = sid {
            self.refresh_sessions.drop_refresh_session(&sid).await?;
        }
        Self::ensure_written(outcome)?;
        info!(?outcome, "token revoked");
        Ok(())
    }

    async fn renew(&self, refresh_token: &SessionToken) -> Result<RenewedSession, SessionError> {
        let claims = self.token_codec.inspect(refresh_token).await?;
        if !claims.is_refresh() {
            return Err(SessionError::Unauthenticated);
        }
        let sid = claims
            .session_id()
            .ok_or(SessionError::Unauthenticated)?
            .to_string();

        // Rotation: check-and-consume
        match self.refresh_sessions.check_refresh_session(&sid, true).await? {
            Some(owner) if owner.as_str() == claims.sub => {}
            Some(owner) => {
                warn!(%owner, subject = %claims.sub, "refresh session owned by another principal");
                return Err(SessionError::Unauthenticated);
            }
            None => {
                debug!(subject = %claims.sub, "refresh session revoked or already used");
                return Err(SessionError::Unauthenticated);
            }
        }

        let key = PrincipalKey(claims.sub);
        let pair = self.issue_pair(&key, claims.extra).await?;

        let outcome = self
            .token_manager
            .refresh_relationship(&key, &pair.access_token)
            .await?;
        Self::ensure_written(outcome)?;
        self.refresh_sessions
            .save_refresh_session(&key, &pair.sid, self.policy.refresh_token_ttl)
            .await?;
        info!(%key, ?outcome, "session renewed");

        Ok(RenewedSession {
            principal: key,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            access_token_expires_at: pair.access_exp,
            refresh_token_expires_at: pair.refresh_exp,
        })
    }
}
