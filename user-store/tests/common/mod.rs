//! Shared test utilities for user-store integration tests.

use reqwest::{Client, Response as ReqwestResponse};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use user_store::MemoryStore;
use user_store::rest::{AppState, create_router};

/// Test server wrapper that runs the REST API over a fresh in-memory store.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Spawn a test server on an OS-assigned port.
    pub async fn spawn() -> Self {
        let app_state = Arc::new(AppState {
            store: Arc::new(MemoryStore::new()),
        });
        let router = create_router(app_state);

        // Bind to port 0 to let the OS choose an available port
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
        let actual_addr = listener.local_addr().unwrap();

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
            addr: actual_addr,
            client: Client::new(),
            shutdown_tx,
        }
    }

    /// Get base URL for the REST API.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Perform a GET request.
    pub async fn get(&self, path: &str) -> ReqwestResponse {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a POST request with JSON body.
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> ReqwestResponse {
        self.client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a PUT request with JSON body.
    pub async fn put_json<T: Serialize>(&self, path: &str, body: &T) -> ReqwestResponse {
        self.client
            .put(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// Perform a DELETE request.
    pub async fn delete(&self, path: &str) -> ReqwestResponse {
        self.client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}
