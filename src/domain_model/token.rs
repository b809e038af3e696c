use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        SessionToken(token.to_string())
    }
}

/// Claim names owned by the codec. Caller claims using one of these are dropped.
pub const REGISTERED_CLAIMS: [&str; 6] = ["jti", "iat", "nbf", "exp", "sub", "iss"];

/// Claim that marks a refresh token.
pub const TOKEN_TYPE_CLAIM: &str = "typ";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claim shared by the access and refresh tokens of one login.
pub const SESSION_ID_CLAIM: &str = "sid";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    pub sub: String,
    pub iss: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn session_id(&self) -> Option<&str> {
        self.extra.get(SESSION_ID_CLAIM).and_then(Value::as_str)
    }

    pub fn is_refresh(&self) -> bool {
        self.extra
            .get(TOKEN_TYPE_CLAIM)
            .and_then(Value::as_str)
            .is_some_and(|typ| typ == REFRESH_TOKEN_TYPE)
    }
}
