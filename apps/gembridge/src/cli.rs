use std::path::PathBuf;

use clap::Parser;
use gembridge_common::GatewayConfigPatch;

#[derive(Parser, Debug)]
#[command(name = "gembridge", version, about)]
pub(crate) struct Cli {
    /// Optional JSON file with the same keys as the flags below (snake_case).
    #[arg(long, env = "GEMBRIDGE_CONFIG")]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, env = "HOST")]
    pub(crate) host: Option<String>,
    #[arg(long, env = "PORT")]
    pub(crate) port: Option<u16>,
    #[arg(long, env = "MASTER_API_KEY", hide_env_values = true)]
    pub(crate) master_key: Option<String>,
    #[arg(long, env = "GCP_PROXY_URL")]
    pub(crate) relay_url: Option<String>,
    #[arg(long, env = "NGINX_INTERNAL_SECRET", hide_env_values = true)]
    pub(crate) relay_secret: Option<String>,
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub(crate) google_api_key: Option<String>,
    #[arg(long, env = "UPSTREAM_BASE_URL")]
    pub(crate) upstream_base_url: Option<String>,
}

impl Cli {
    pub(crate) fn patch(&self) -> GatewayConfigPatch {
        GatewayConfigPatch {
            host: self.host.clone(),
            port: self.port,
            master_key: self.master_key.clone(),
            relay_url: self.relay_url.clone(),
            relay_secret: self.relay_secret.clone(),
            google_api_key: self.google_api_key.clone(),
            upstream_base_url: self.upstream_base_url.clone(),
        }
    }
}
