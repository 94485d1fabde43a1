//! Swap estimator service entry point

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swap_estimator::config::DEFAULT_CONFIG_PATH;
use swap_estimator::{ChainPairReader, EstimationEngine, EstimatorConfig, EstimatorServer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path, defaults to config/estimator.toml when present
    #[arg(short, long, env = "ESTIMATOR_CONFIG")]
    config: Option<PathBuf>,

    /// RPC endpoint, overrides the configured one
    #[arg(long)]
    rpc_url: Option<String>,

    /// Bind address, overrides the configured one
    #[arg(long)]
    listen_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swap_estimator=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting swap estimator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = EstimatorConfig::resolve_path(args.config, Path::new(DEFAULT_CONFIG_PATH));
    let mut config = EstimatorConfig::from_sources(config_path.as_deref())?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }
    let config = config.validated()?;

    info!(
        "Configuration: listen={} request_timeout={:?} call_timeout={:?} fee={}/{}",
        config.listen_addr,
        config.request_timeout(),
        config.call_timeout(),
        config.fee_numerator,
        config.fee_denominator
    );

    let reader = ChainPairReader::connect(&config.rpc_url, config.call_timeout())?;
    let engine = EstimationEngine::new(Arc::new(reader), config.engine_config()?);
    let server = EstimatorServer::new(Arc::new(engine), config.request_timeout());

    server
        .run(
            config.socket_addr()?,
            config.shutdown_timeout(),
            shutdown_signal(),
        )
        .await?;

    info!("Swap estimator stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
