//! Shared building blocks for gembridge.
//!
//! This crate intentionally does **not** depend on axum or any concrete HTTP client.
//! The translator builds `UpstreamHttpRequest` values and hands them to a `RelayClient`;
//! the transport behind that trait lives in a higher layer.

pub mod config;
pub mod error;
pub mod headers;
pub mod relay;

pub use config::{ConfigError, GatewayConfig, GatewayConfigPatch, RelayConfig, hash_master_key};
pub use error::{GatewayError, GatewayResult};
pub use headers::{Headers, header_get, header_remove, header_set, headers_from_map};
pub use relay::{
    HttpMethod, RELAY_AUTH_HEADER, RELAY_TARGET_HEADER, RelayClient, UpstreamHttpRequest,
    UpstreamHttpResponse, relay_request,
};
