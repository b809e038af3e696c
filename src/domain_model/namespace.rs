use crate::domain_model::{PrincipalKey, SessionToken};

pub const DEFAULT_PRINCIPAL_PREFIX: &str = "AUTHORIZATION_KEY_";
pub const DEFAULT_TOKEN_PREFIX: &str = "AUTHORIZATION_TOKEN_";
pub const DEFAULT_REFRESH_PREFIX: &str = "AUTHORIZATION_REFRESH_";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("namespace prefix must not be empty")]
    Empty,
    #[error("namespace prefixes overlap: {0:?} and {1:?}")]
    Overlapping(String, String),
}

/// Store key prefixes for the entry families kept by a session.
///
/// No prefix may be a prefix of another, so a principal-keyed entry can never
/// collide with a token-keyed or refresh-session entry.
#[derive(Debug, Clone)]
pub struct KeyNamespace {
    principal_prefix: String,
    token_prefix: String,
    refresh_prefix: String,
}

impl KeyNamespace {
    pub fn new(
        principal_prefix: impl Into<String>,
        token_prefix: impl Into<String>,
        refresh_prefix: impl Into<String>,
    ) -> Result<Self, NamespaceError> {
        let prefixes = [
            principal_prefix.into(),
            token_prefix.into(),
            refresh_prefix.into(),
        ];
        if prefixes.iter().any(String::is_empty) {
            return Err(NamespaceError::Empty);
        }
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    return Err(NamespaceError::Overlapping(a.clone(), b.clone()));
                }
            }
        }
        let [principal_prefix, token_prefix, refresh_prefix] = prefixes;
        Ok(KeyNamespace {
            principal_prefix,
            token_prefix,
            refresh_prefix,
        })
    }

    pub fn principal_entry(&self, key: &PrincipalKey) -> String {
        format!("{}{}", self.principal_prefix, key)
    }

    pub fn token_entry(&self, token: &SessionToken) -> String {
        format!("{}{}", self.token_prefix, token)
    }

    /// Refresh session id -> principal.
    pub fn refresh_session_entry(&self, sid: &str) -> String {
        format!("{}sid:{}", self.refresh_prefix, sid)
    }

    /// Principal -> current refresh session id (single-token mode).
    pub fn refresh_principal_entry(&self, key: &PrincipalKey) -> String {
        format!("{}key:{}", self.refresh_prefix, key)
    }
}

impl Default for KeyNamespace {
    fn default() -> Self {
        KeyNamespace {
            principal_prefix: DEFAULT_PRINCIPAL_PREFIX.to_string(),
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            refresh_prefix: DEFAULT_REFRESH_PREFIX.to_string(),
        }
    }
}
