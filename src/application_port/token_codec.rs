use crate::domain_model::{SessionToken, TokenClaims};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("internal error: {0}")]
    InternalError(String),
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    /// Mint a signed token for `subject`. A `None` ttl yields a token without `exp`.
    async fn issue(
        &self,
        subject: &str,
        claims: Map<String, Value>,
        ttl: Option<Duration>,
    ) -> Result<(SessionToken, Option<DateTime<Utc>>), TokenError>;

    /// Claims of a well-signed, currently valid token; `None` for anything else.
    async fn verify(&self, token: &SessionToken) -> Option<TokenClaims> {
        self.inspect(token).await.ok()
    }

    async fn inspect(&self, token: &SessionToken) -> Result<TokenClaims, TokenError>;

    /// Like `inspect`, but only signature, issuer and structure are checked.
    async fn inspect_signed(&self, token: &SessionToken) -> Result<TokenClaims, TokenError>;

    /// True if `exp` lies strictly in the past. Unparsable tokens count as expired.
    async fn is_expired(&self, token: &SessionToken) -> bool;
}
