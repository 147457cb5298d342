use clap::Parser;
use gateway_http::{router, AppState};
use gateway_registry::Registry;
use gateway_worker::{ManagerSettings, WorkerManager};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "mcp-gateway",
    about = "MCP Gateway - manage stdio MCP servers behind an HTTP facade",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Bind host for the HTTP facade
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for the HTTP facade
    #[arg(long, default_value = "8001")]
    port: u16,

    /// Path to the server registry file
    #[arg(long, default_value = "mcp_servers.yaml")]
    config: String,

    /// Per-call response deadline in seconds
    #[arg(long, default_value = "30")]
    call_timeout: u64,

    /// Skip the initialize/tools-list handshake on first use of a worker
    #[arg(long)]
    skip_handshake: bool,

    /// Enable debug logging
    #[arg(long, short)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("MCP Gateway starting");
    info!("Registry file: {}", args.config);

    let registry = Registry::load(&args.config)?;
    let settings = ManagerSettings {
        call_timeout: Duration::from_secs(args.call_timeout),
        stop_grace: Duration::from_secs(5),
        handshake: !args.skip_handshake,
    };
    let manager: AppState = Arc::new(WorkerManager::new(registry, settings));

    let app = router(manager.clone());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, stopping all servers");
    manager.stop_all().await;
    info!("MCP Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    } else {
        info!("Received interrupt signal, shutting down gracefully");
    }
}
