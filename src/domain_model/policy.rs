use std::time::Duration;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_GRACE_TTL: Duration = Duration::from_secs(5 * 60);

/// How many live tokens a principal may hold at once.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionMode {
    /// One live token per principal; a new login revokes the previous one.
    Single,
    /// Any number of independently revocable tokens per principal.
    Multiple,
}

impl SessionMode {
    pub fn from_single_token_flag(single_token_mode: bool) -> Self {
        if single_token_mode {
            SessionMode::Single
        } else {
            SessionMode::Multiple
        }
    }
}

/// Immutable session settings, built once at startup and shared by reference.
#[derive(Clone)]
pub struct SessionPolicy {
    pub mode: SessionMode,
    pub token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// TTL left on a replaced token during a refresh handoff.
    pub grace_ttl: Duration,
    pub refresh_on_lookup: bool,
    pub signing_secret: Vec<u8>,
    pub issuer: String,
}

impl SessionPolicy {
    pub fn new(mode: SessionMode, signing_secret: Vec<u8>) -> Self {
        SessionPolicy {
            mode,
            token_ttl: DEFAULT_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            grace_ttl: DEFAULT_GRACE_TTL,
            refresh_on_lookup: true,
            signing_secret,
            issuer: "tokenbind".to_string(),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for SessionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPolicy")
            .field("mode", &self.mode)
            .field("token_ttl", &self.token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("grace_ttl", &self.grace_ttl)
            .field("refresh_on_lookup", &self.refresh_on_lookup)
            .field("signing_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}
