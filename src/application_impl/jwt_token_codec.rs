use crate::application_port::{TokenCodec, TokenError};
use crate::domain_model::{REGISTERED_CLAIMS, SessionPolicy, SessionToken, TokenClaims};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const JTI_ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Eight alphanumeric characters from a 128-bit value, one per 16-bit group.
pub fn short_id(value: u128) -> String {
    (0..8u32)
        .map(|i| {
            let group = (value >> (112 - i * 16)) as u16;
            JTI_ALPHABET[(group % 62) as usize] as char
        })
        .collect()
}

pub struct JwtHs256Codec {
    policy: Arc<SessionPolicy>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn new(policy: Arc<SessionPolicy>) -> Self {
        let encoding_key = EncodingKey::from_secret(&policy.signing_secret);
        let decoding_key = DecodingKey::from_secret(&policy.signing_secret);
        JwtHs256Codec {
            policy,
            encoding_key,
            decoding_key,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        short_id(uuid::Uuid::new_v4().as_u128())
    }

    fn validation(&self, check_time: bool) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 0;
        v.validate_exp = check_time;
        v.validate_nbf = check_time;
        v.validate_aud = false;
        v.set_required_spec_claims(&["sub"]);
        v.set_issuer(&[self.policy.issuer.clone()]);
        v
    }

    pub(crate) fn encode_at(
        &self,
        subject: &str,
        claims: Map<String, Value>,
        ttl: Option<Duration>,
        issued_at: DateTime<Utc>,
    ) -> Result<(SessionToken, Option<DateTime<Utc>>), TokenError> {
        let exp_dt = ttl.map(|ttl| issued_at + ttl);
        let mut extra = claims;
        extra.retain(|name, _| {
            let registered = REGISTERED_CLAIMS.contains(&name.as_str());
            if registered {
                debug!(claim = %name, "dropping caller claim shadowing a registered claim");
            }
            !registered
        });
        let claims = TokenClaims {
            jti: Self::gen_jti(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: exp_dt.map(|dt| dt.timestamp()),
            sub: subject.to_string(),
            iss: self.policy.issuer.clone(),
            extra,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::InternalError(e.to_string()))?;
        Ok((SessionToken(token), exp_dt))
    }

    fn decode_claims(&self, token: &str, check_time: bool) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation(check_time))
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue(
        &self,
        subject: &str,
        claims: Map<String, Value>,
        ttl: Option<Duration>,
    ) -> Result<(SessionToken, Option<DateTime<Utc>>), TokenError> {
        self.encode_at(subject, claims, ttl, Utc::now())
    }

    async fn inspect(&self, token: &SessionToken) -> Result<TokenClaims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }
        self.decode_claims(token.as_str(), true)
    }

    async fn inspect_signed(&self, token: &SessionToken) -> Result<TokenClaims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }
        self.decode_claims(token.as_str(), false)
    }

    async fn is_expired(&self, token: &SessionToken) -> bool {
        match self.inspect_signed(token).await {
            Ok(claims) => claims.exp.is_some_and(|exp| exp < Utc::now().timestamp()),
            Err(_) => true,
        }
    }
}
