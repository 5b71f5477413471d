//! Report backend server binary

use anyhow::Context;
use clap::Parser;
use report_server::{AppState, ServerConfig, app};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "report-server", about = "Stock report backend")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "BIND_ADDRESS")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000, env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    report_utils::init_tracing();
    let args = Args::parse();

    let config = ServerConfig::from_env().context("failed to load configuration")?;
    let state = AppState::from_config(&config).context("failed to initialize collaborators")?;

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
        () = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        () = terminate => {
            info!("received SIGTERM signal");
        },
    }
}
