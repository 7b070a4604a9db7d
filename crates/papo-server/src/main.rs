use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use papo_core::{Session, SystemClock, run_sweep_loop};
use papo_server::config::ServerConfig;
use papo_server::{AppStateInner, app, open_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "papo=debug,papo_server=debug,papo_core=debug,papo_db=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let store = open_store(&config.db_path)?;
    let session = Session::new(store, Arc::new(SystemClock::new()));

    // Sweeper runs until shutdown
    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(run_sweep_loop(session.registry(), config.sweep, shutdown.clone()));

    let router = app(Arc::new(AppStateInner { session }));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Papo server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    sweeper.await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}
