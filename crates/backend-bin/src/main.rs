use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    config::Settings,
    router,
    storage::{FlatFileStorage, MemoryStorage, Storage, StoreLocation},
    sweeper, AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Chatroom HTTP server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the bind address from the config
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut settings = Settings::load_from(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }

    init_tracing(&settings);

    match settings.store_location()? {
        StoreLocation::Memory => {
            tracing::warn!("Using the in-memory store; history is lost on restart");
            serve(MemoryStorage::new(), settings).await
        },
        StoreLocation::File(path) => {
            let storage = FlatFileStorage::new(&path)
                .with_context(|| format!("opening store at {}", path.display()))?;
            serve(storage, settings).await
        },
    }
}

async fn serve<S: Storage + Clone + 'static>(storage: S, settings: Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(storage));

    let sweeper = sweeper::spawn_sweeper(state.registry.clone(), &settings.sweep);

    let app = router::create_router(state);

    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    tracing::info!("listening on {}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
