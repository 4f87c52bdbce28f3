//! PromptGate Server
//!
//! Prompt pre-filter standing between user submissions and a downstream
//! LLM. Serves the same allow/redact/block decision semantics over two
//! transports: a JSON/HTTP endpoint and a raw line-oriented TCP protocol.
//!
//! Startup is fail-closed: without a validated policy document the process
//! exits before binding any listener.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use promptgate_filters::SimilarityGuard;
use promptgate_policy::{PolicyEngine, PolicyStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use promptgate_server::{routes, tcp, AppState};

#[derive(Parser, Debug)]
#[command(name = "promptgate-server")]
#[command(about = "PromptGate prompt pre-filter", long_about = None)]
struct Cli {
    /// Policy document path
    #[arg(short, long, default_value = "policy.yaml")]
    policy: String,

    /// Listen address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    listen: String,

    /// HTTP listen port
    #[arg(short = 'P', long, default_value = "8080")]
    port: u16,

    /// TCP line-protocol listen port
    #[arg(short = 't', long, default_value = "1344")]
    tcp_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting PromptGate server");

    // Load the policy. Fail-closed: an absent or invalid policy means the
    // service must not come up, since no policy is equivalent to allowing
    // everything.
    let store = Arc::new(
        PolicyStore::load(&cli.policy)
            .with_context(|| format!("refusing to start without a valid policy ({})", cli.policy))?,
    );
    info!("Policy: {}", cli.policy);

    // The embedding oracle is a capability; none is wired in by default, so
    // the engine runs with keyword and redaction coverage only.
    let engine = Arc::new(PolicyEngine::new(store, SimilarityGuard::disabled()));

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    let state = AppState::new(engine, metrics_handle);

    // TCP line-protocol adapter
    let tcp_addr: SocketAddr = format!("{}:{}", cli.listen, cli.tcp_port).parse()?;
    let tcp_listener = tokio::net::TcpListener::bind(tcp_addr)
        .await
        .with_context(|| format!("failed to bind TCP adapter on {}", tcp_addr))?;
    let tcp_task = tokio::spawn(tcp::serve(tcp_listener, state.clone()));

    // HTTP adapter
    let http_addr: SocketAddr = format!("{}:{}", cli.listen, cli.port).parse()?;
    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP adapter on {}", http_addr))?;
    info!("HTTP listening on http://{}", http_addr);

    let app = routes::create_router(state);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tcp_task.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("promptgate=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("promptgate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    promptgate_telemetry::metrics::describe();

    info!("Metrics exporter initialized");
    Ok(handle)
}
