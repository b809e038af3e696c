use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the authenticated subject a token is bound to.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalKey(pub String);

impl PrincipalKey {
    pub fn new(key: impl Into<String>) -> Self {
        PrincipalKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PrincipalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrincipalKey {
    fn from(key: &str) -> Self {
        PrincipalKey(key.to_string())
    }
}
