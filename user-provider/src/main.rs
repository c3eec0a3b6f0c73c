//! user-provider: reconciles declared users with a user-store.
//!
//! Loads the provider configs and a manifest of managed users, then keeps
//! every user converged until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_store::MemoryStore;

use user_provider::connector::{
    HttpServiceFactory, LocalServiceFactory, ServiceFactory, SourceResolver,
};
use user_provider::resource::DEFAULT_PROVIDER_CONFIG;
use user_provider::{
    CancelHandle, Controller, CredentialsSource, Manifest, ProviderConfig, ProviderSettings,
    ReconcilerOptions, ServiceConnector, UserReconciler, WorkQueue,
};

/// User provider
#[derive(Parser, Debug)]
#[command(name = "user-provider", version, about)]
struct Args {
    /// Provider config file (JSON); defaults to a single "default" config
    #[arg(long)]
    config: Option<PathBuf>,

    /// user-store endpoint for the default provider config
    #[arg(long, default_value = "http://[::1]:50051")]
    endpoint: String,

    /// Manifest of managed users (JSON)
    #[arg(long)]
    manifest: PathBuf,

    /// Seconds between passes over a converged user
    #[arg(long, default_value = "60")]
    poll_interval: u64,

    /// Deadline in seconds for each store call
    #[arg(long, default_value = "10")]
    call_timeout: u64,

    /// Maximum number of concurrent reconciles
    #[arg(long, default_value = "4")]
    max_concurrent: usize,

    /// Reconcile against an in-process store instead of the endpoint
    #[arg(long)]
    embedded: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_provider=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => ProviderSettings::load(path)
            .with_context(|| format!("loading provider configs from {}", path.display()))?,
        None => ProviderSettings {
            provider_configs: vec![ProviderConfig {
                name: DEFAULT_PROVIDER_CONFIG.to_string(),
                endpoint: args.endpoint.clone(),
                credentials: CredentialsSource::None,
            }],
        },
    };
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("loading manifest from {}", args.manifest.display()))?;

    let call_timeout = Duration::from_secs(args.call_timeout);
    let factory: Arc<dyn ServiceFactory> = if args.embedded {
        info!("Using embedded in-memory store");
        Arc::new(LocalServiceFactory::new(Arc::new(MemoryStore::new())))
    } else {
        Arc::new(HttpServiceFactory::new(call_timeout))
    };

    info!(
        "Starting user-provider: {} provider configs, {} users",
        settings.provider_configs.len(),
        manifest.users.len()
    );

    let connector = ServiceConnector::new(settings, Arc::new(SourceResolver), factory);
    let reconciler = UserReconciler::new(
        Arc::new(connector),
        ReconcilerOptions {
            poll_interval: Duration::from_secs(args.poll_interval),
            call_timeout,
            ..Default::default()
        },
    );

    let (queue, rx) = WorkQueue::new();
    let controller = Arc::new(Controller::new(
        reconciler,
        Arc::new(queue),
        args.max_concurrent,
    ));
    for user in manifest.users {
        controller.apply(user);
    }

    let shutdown = CancelHandle::new();
    let token = shutdown.token();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    controller.run(rx, token).await;
    info!("user-provider stopped");
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
