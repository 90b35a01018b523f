pub mod auth;
pub mod classify;
pub mod core;
pub mod cors;
pub mod error;
pub mod handler;
pub mod upstream_client;

pub use auth::{AuthProvider, MasterKeyAuth};
pub use classify::{Operation, ROUTES, Route};
pub use crate::core::{Core, CoreState, UpstreamTarget, handle};
pub use upstream_client::{RelayClientConfig, WreqRelayClient};
