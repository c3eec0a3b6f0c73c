//! Shared test utilities for user-provider integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use user_provider::connector::{
    HttpServiceFactory, LocalServiceFactory, ServiceFactory, SourceResolver,
};
use user_provider::{
    CredentialsSource, ProviderConfig, ProviderSettings, ReconcilerOptions, ServiceConnector,
    UserReconciler, UserResource, UserSpec,
};
use user_store::MemoryStore;
use user_store::rest::{AppState, create_router};

/// user-store REST server over an in-memory store the test can inspect.
pub struct StoreServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl StoreServer {
    /// Spawn a store server on an OS-assigned port.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = create_router(Arc::new(AppState {
            store: store.clone(),
        }));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        Self {
            addr,
            store,
            shutdown_tx,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

pub fn provider_config(name: &str, endpoint: &str, credentials: CredentialsSource) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        endpoint: endpoint.to_string(),
        credentials,
    }
}

/// Reconciler over `configs`, building services with `factory`.
pub fn reconciler(configs: Vec<ProviderConfig>, factory: Arc<dyn ServiceFactory>) -> UserReconciler {
    let connector = ServiceConnector::new(
        ProviderSettings {
            provider_configs: configs,
        },
        Arc::new(SourceResolver),
        factory,
    );
    UserReconciler::new(Arc::new(connector), ReconcilerOptions::default())
}

/// Reconciler bound to an in-process store through the default provider config.
pub fn local_reconciler(store: Arc<MemoryStore>) -> UserReconciler {
    reconciler(
        vec![provider_config("default", "local", CredentialsSource::None)],
        Arc::new(LocalServiceFactory::new(store)),
    )
}

/// Reconciler talking HTTP to `endpoint` through the default provider config.
pub fn http_reconciler(endpoint: &str) -> UserReconciler {
    reconciler(
        vec![provider_config("default", endpoint, CredentialsSource::None)],
        Arc::new(HttpServiceFactory::new(Duration::from_secs(5))),
    )
}

pub fn user(resource: &str, id: &str, name: &str) -> UserResource {
    UserResource::new(
        resource,
        UserSpec {
            id: id.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        },
    )
}
