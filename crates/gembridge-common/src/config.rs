use http::Uri;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid url for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Where outbound traffic is relayed and the secret the relay expects.
///
/// Both are optional at startup; a request that needs the relay fails with a
/// configuration error while either is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    pub url: Option<String>,
    pub secret: Option<String>,
}

/// Final, merged configuration used by the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// blake3 hex digest of the master key. `None` rejects every non-preflight request.
    pub master_key_hash: Option<String>,
    pub relay: RelayConfig,
    /// Sent upstream as `x-goog-api-key` when set.
    pub google_api_key: Option<String>,
    pub upstream_base_url: String,
}

/// Optional layer used for merging configuration.
///
/// Merge order: CLI/ENV > config file > built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Plaintext; hashed in `into_config`.
    pub master_key: Option<String>,
    pub relay_url: Option<String>,
    pub relay_secret: Option<String>,
    pub google_api_key: Option<String>,
    pub upstream_base_url: Option<String>,
}

impl GatewayConfigPatch {
    pub fn overlay(&mut self, other: GatewayConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.master_key.is_some() {
            self.master_key = other.master_key;
        }
        if other.relay_url.is_some() {
            self.relay_url = other.relay_url;
        }
        if other.relay_secret.is_some() {
            self.relay_secret = other.relay_secret;
        }
        if other.google_api_key.is_some() {
            self.google_api_key = other.google_api_key;
        }
        if other.upstream_base_url.is_some() {
            self.upstream_base_url = other.upstream_base_url;
        }
    }

    pub fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let relay_url = non_empty(self.relay_url)
            .map(|value| validate_url("relay_url", value))
            .transpose()?;
        let upstream_base_url = validate_url(
            "upstream_base_url",
            non_empty(self.upstream_base_url)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string()),
        )?;

        Ok(GatewayConfig {
            host: non_empty(self.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            master_key_hash: non_empty(self.master_key).map(|key| hash_master_key(&key)),
            relay: RelayConfig {
                url: relay_url,
                secret: non_empty(self.relay_secret),
            },
            google_api_key: non_empty(self.google_api_key),
            upstream_base_url: upstream_base_url.trim_end_matches('/').to_string(),
        })
    }
}

pub fn hash_master_key(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn validate_url(field: &'static str, value: String) -> Result<String, ConfigError> {
    let valid = value
        .parse::<Uri>()
        .ok()
        .is_some_and(|uri| uri.scheme().is_some() && uri.host().is_some());
    if valid {
        Ok(value)
    } else {
        Err(ConfigError::InvalidUrl { field, value })
    }
}
