use anyhow::{Context, Result};
use clap::Parser;
use corral_api::{ApiServer, ServerConfig};
use corral_core::{Config, Runtime};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "corral-daemon")]
#[command(author, version, about, long_about = None)]
pub struct DaemonArgs {
    /// Unix socket path for the service API (default: ~/.corral/corral.sock).
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Data directory for Corral.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file to load instead of the default locations.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corral=info,corral_daemon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    run(DaemonArgs::parse()).await
}

async fn run(args: DaemonArgs) -> Result<()> {
    info!("starting corral daemon...");

    let mut config = match args.config {
        Some(ref path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(socket) = args.socket {
        config.api.socket_path = socket;
    }

    let socket_path = config.api.socket_path.clone();
    let pid_file = config.pid_file();

    std::fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    std::fs::write(&pid_file, format!("{}\n", std::process::id()))
        .context("failed to write daemon PID file")?;

    let runtime = Arc::new(Runtime::new(config).context("failed to create runtime")?);
    runtime
        .init()
        .await
        .context("failed to initialize runtime")?;

    let api_server = ApiServer::new(
        ServerConfig {
            socket_path: socket_path.clone(),
        },
        Arc::clone(&runtime),
    );

    let api_handle = tokio::spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!("service API server error: {}", e);
        }
    });

    println!("corral daemon started");
    println!("  API:  {}", socket_path.display());
    println!("  Data: {}", runtime.config().data_dir.display());
    println!();
    println!("Press Ctrl+C to stop.");

    shutdown_signal().await;
    info!("shutdown signal received");

    api_handle.abort();

    runtime
        .shutdown()
        .await
        .context("failed to shutdown runtime")?;

    if let Err(e) = std::fs::remove_file(&socket_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove socket {}: {}", socket_path.display(), e);
        }
    }
    if let Err(e) = std::fs::remove_file(&pid_file) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove PID file {}: {}", pid_file.display(), e);
        }
    }

    info!("corral daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
