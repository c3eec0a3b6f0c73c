use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use user_store::MemoryStore;
use user_store::rest::{AppState, create_router};

#[derive(Parser)]
#[command(name = "user-store")]
#[command(about = "User store service - in-memory user records with existence-aware CRUD")]
struct Args {
    /// Listen address for REST API
    #[arg(short, long, default_value = "[::1]:50051")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("user_store=info".parse()?)
                .add_directive("tower_http=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    let app_state = Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
    });
    let router = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("REST API listening on {}", args.listen);

    // Run server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(_) => {
                let _ = ctrl_c.await;
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("Received SIGINT");
    }
}
