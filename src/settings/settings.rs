use crate::domain_model::{KeyNamespace, SessionMode, SessionPolicy};
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub session: Session,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub log: Log,
}

#[derive(Deserialize)]
pub struct Session {
    pub signing_secret: String, // base64
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: u64,
    #[serde(default = "default_grace_ttl_secs")]
    pub grace_ttl_secs: u64,
    #[serde(default)]
    pub single_token_mode: bool,
    #[serde(default = "default_true")]
    pub refresh_on_lookup: bool,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("grace_ttl_secs", &self.grace_ttl_secs)
            .field("single_token_mode", &self.single_token_mode)
            .field("refresh_on_lookup", &self.refresh_on_lookup)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    pub redis_url: Option<String>,
    pub principal_prefix: String,
    pub token_prefix: String,
    pub refresh_prefix: String,
}

impl Default for Store {
    fn default() -> Self {
        Store {
            backend: "redis".to_string(),
            redis_url: None,
            principal_prefix: crate::domain_model::DEFAULT_PRINCIPAL_PREFIX.to_string(),
            token_prefix: crate::domain_model::DEFAULT_TOKEN_PREFIX.to_string(),
            refresh_prefix: crate::domain_model::DEFAULT_REFRESH_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Log {
    pub filter: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            filter: "info".to_string(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    1800
}

fn default_refresh_token_ttl_secs() -> u64 {
    604800
}

fn default_grace_ttl_secs() -> u64 {
    300
}

/// Upper bound for any configured TTL (ten years).
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn ttl(name: &str, secs: u64) -> Result<Duration> {
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(anyhow!(
            "{} must be between 1 and {} seconds, got {}",
            name,
            MAX_TTL_SECS,
            secs
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn default_true() -> bool {
    true
}

fn default_issuer() -> String {
    "tokenbind".to_string()
}

impl Session {
    pub fn policy(&self) -> Result<SessionPolicy> {
        let signing_secret = STANDARD
            .decode(self.signing_secret.trim())
            .map_err(|e| anyhow!("signing_secret is not valid base64: {}", e))?;
        if signing_secret.is_empty() {
            return Err(anyhow!("signing_secret must not be empty"));
        }
        let token_ttl = ttl("token_ttl_secs", self.token_ttl_secs)?;
        let refresh_token_ttl = ttl("refresh_token_ttl_secs", self.refresh_token_ttl_secs)?;
        let grace_ttl = ttl("grace_ttl_secs", self.grace_ttl_secs)?;
        Ok(SessionPolicy {
            mode: SessionMode::from_single_token_flag(self.single_token_mode),
            token_ttl,
            refresh_token_ttl,
            grace_ttl,
            refresh_on_lookup: self.refresh_on_lookup,
            signing_secret,
            issuer: self.issuer.clone(),
        })
    }
}

impl Store {
    pub fn namespace(&self) -> Result<KeyNamespace> {
        KeyNamespace::new(
            self.principal_prefix.clone(),
            self.token_prefix.clone(),
            self.refresh_prefix.clone(),
        )
        .map_err(|e| anyhow!(e))
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Load settings from a TOML file, overridden by `TOKENBIND__SECTION__FIELD` variables.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("TOKENBIND").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
