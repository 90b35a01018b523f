use anyhow::Context;
use clap::Parser;
use gembridge_common::{GatewayConfig, GatewayConfigPatch};
use gembridge_core::Core;
use tracing::{info, warn};

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("gembridge failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(
        host = %config.host,
        port = config.port,
        upstream = %config.upstream_base_url,
        relay_url = %config.relay.url.as_deref().unwrap_or(""),
        master_key_set = config.master_key_hash.is_some(),
        google_api_key_set = config.google_api_key.is_some(),
        "config loaded"
    );
    if config.relay.url.is_none() || config.relay.secret.is_none() {
        warn!("relay url or secret not set; upstream calls will fail with a configuration error");
    }
    if config.master_key_hash.is_none() {
        warn!("master key not set; every request except preflight will be rejected");
    }

    let core = Core::from_config(&config).context("build relay client")?;
    let app = core.router();

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// CLI/ENV values override the config file, which overrides built-in defaults.
fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let mut patch = match cli.config.as_deref() {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            serde_json::from_slice::<GatewayConfigPatch>(&raw)
                .with_context(|| format!("parse config file {}", path.display()))?
        }
        None => GatewayConfigPatch::default(),
    };
    patch.overlay(cli.patch());
    Ok(patch.into_config()?)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gembridge=info,gembridge_core=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
