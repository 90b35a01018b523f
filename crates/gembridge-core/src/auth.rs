use gembridge_common::{GatewayError, GatewayResult, hash_master_key};
use http::HeaderMap;

pub const MASTER_KEY_HEADER: &str = "x-master-key";

pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> GatewayResult<()>;
}

/// Accepts a request only when its `X-Master-Key` hashes to the configured digest.
///
/// With no configured key every request is rejected.
#[derive(Debug, Clone, Default)]
pub struct MasterKeyAuth {
    key_hash: Option<String>,
}

impl MasterKeyAuth {
    /// `key_hash` is the blake3 hex digest produced by `hash_master_key`.
    pub fn new(key_hash: Option<String>) -> Self {
        Self { key_hash }
    }

    pub fn from_plain(key: &str) -> Self {
        Self::new(Some(hash_master_key(key)))
    }
}

impl AuthProvider for MasterKeyAuth {
    fn authenticate(&self, headers: &HeaderMap) -> GatewayResult<()> {
        let expected = self.key_hash.as_deref().ok_or(GatewayError::Unauthorized)?;
        let provided = headers
            .get(MASTER_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(GatewayError::Unauthorized)?;

        let expected =
            blake3::Hash::from_hex(expected).map_err(|_| GatewayError::Unauthorized)?;
        // `Hash` equality is constant-time.
        if blake3::hash(provided.as_bytes()) == expected {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }
}
