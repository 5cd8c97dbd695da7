//! qsimd binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use qsimd_adapter_sim::StatevectorBackend;
use qsimd_render::PngRenderer;
use qsimd_server::{AppState, Config, TracingConfig, create_router, init_tracing};

/// Quantum circuit simulation service.
#[derive(Parser, Debug)]
#[command(name = "qsimd", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "QSIMD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Log output format: console or json
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    config.validate().context("invalid configuration")?;

    init_tracing(TracingConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let bind_addr = config.bind_address()?;
    let backend = StatevectorBackend::with_max_qubits(config.simulation.max_qubits)
        .with_max_shots(config.simulation.max_shots);
    info!(
        backend = "statevector",
        max_qubits = config.simulation.max_qubits,
        workers = config.limits.max_concurrent_jobs,
        queue = config.limits.max_queued_jobs,
        timeout_ms = config.limits.job_timeout_ms,
        "Configured simulation backend"
    );

    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        config,
        Arc::new(backend),
        Arc::new(PngRenderer::default()),
    ));
    let app = create_router(state.clone());

    info!("Starting qsimd at http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            state.begin_shutdown();
        })
        .await?;

    info!("qsimd shut down");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
