use crate::application_port::{TokenError, TokenManagerError};
use crate::domain_model::{PrincipalKey, SessionToken};
use crate::domain_port::KeyStoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Covers invalid, expired and revoked tokens alike.
    #[error("not authenticated")]
    Unauthenticated,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenManagerError> for SessionError {
    fn from(err: TokenManagerError) -> Self {
        match err {
            TokenManagerError::StoreUnavailable(e) => SessionError::Store(e),
        }
    }
}

impl From<KeyStoreError> for SessionError {
    fn from(err: KeyStoreError) -> Self {
        SessionError::Store(err.to_string())
    }
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => SessionError::Unauthenticated,
            TokenError::InternalError(e) => SessionError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub principal: PrincipalKey,
    pub access_token: SessionToken,
    pub refresh_token: SessionToken,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenewedSession {
    pub principal: PrincipalKey,
    pub access_token: SessionToken,
    pub refresh_token: SessionToken,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Issue access and refresh tokens for an already authenticated principal.
    async fn login(
        &self,
        key: PrincipalKey,
        claims: Map<String, Value>,
    ) -> Result<IssuedSession, SessionError>;
    async fn authenticate(&self, access_token: &SessionToken) -> Result<PrincipalKey, SessionError>;
    async fn logout(&self, key: &PrincipalKey) -> Result<(), SessionError>;
    async fn revoke(&self, access_token: &SessionToken) -> Result<(), SessionError>;
    /// Trade a refresh token for a new token pair. Each refresh token works once.
    async fn renew(&self, refresh_token: &SessionToken) -> Result<RenewedSession, SessionError>;
}
