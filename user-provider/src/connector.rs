//! Connector: resolves a resource's provider config and credentials and
//! produces an external client bound to the store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use user_store::UserStore;

use crate::clients::{HttpUserService, LocalUserService, UserService};
use crate::config::{CredentialsSource, ProviderConfig, ProviderSettings};
use crate::error::ConnectError;
use crate::external::ExternalClient;
use crate::resource::UserResource;

/// Resolved credentials for a provider config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolves the credentials a provider config references.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, config: &ProviderConfig) -> Result<Credentials, ConnectError>;
}

/// Resolver reading inline, environment and file credential sources.
pub struct SourceResolver;

#[async_trait]
impl CredentialResolver for SourceResolver {
    async fn resolve(&self, config: &ProviderConfig) -> Result<Credentials, ConnectError> {
        let token = match &config.credentials {
            CredentialsSource::None => return Ok(Credentials::default()),
            CredentialsSource::Inline { token } => token.clone(),
            CredentialsSource::Env { var } => std::env::var(var).map_err(|_| {
                ConnectError::CredentialResolutionFailed(format!(
                    "environment variable {} is not set",
                    var
                ))
            })?,
            CredentialsSource::File { path } => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| {
                    ConnectError::CredentialResolutionFailed(format!(
                        "cannot read {}: {}",
                        path.display(),
                        e
                    ))
                })?
                .trim()
                .to_string(),
        };

        if token.is_empty() {
            return Err(ConnectError::CredentialResolutionFailed(format!(
                "empty token for provider config {}",
                config.name
            )));
        }
        Ok(Credentials { token: Some(token) })
    }
}

/// Builds a service handle from a provider config and its credentials.
pub trait ServiceFactory: Send + Sync {
    fn build(
        &self,
        config: &ProviderConfig,
        credentials: Credentials,
    ) -> Result<Arc<dyn UserService>, ConnectError>;
}

/// Factory for HTTP clients talking to a remote user-store.
pub struct HttpServiceFactory {
    timeout: Duration,
}

impl HttpServiceFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ServiceFactory for HttpServiceFactory {
    fn build(
        &self,
        config: &ProviderConfig,
        credentials: Credentials,
    ) -> Result<Arc<dyn UserService>, ConnectError> {
        let service = HttpUserService::new(&config.endpoint, credentials.token, self.timeout)
            .map_err(ConnectError::ConnectionFailed)?;
        Ok(Arc::new(service))
    }
}

/// Factory binding every provider config to one in-process store.
pub struct LocalServiceFactory {
    store: Arc<dyn UserStore>,
}

impl LocalServiceFactory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

impl ServiceFactory for LocalServiceFactory {
    fn build(
        &self,
        _config: &ProviderConfig,
        _credentials: Credentials,
    ) -> Result<Arc<dyn UserService>, ConnectError> {
        Ok(Arc::new(LocalUserService::new(Arc::clone(&self.store))))
    }
}

/// Produces an external client for a managed resource.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, resource: &UserResource) -> Result<ExternalClient, ConnectError>;
}

/// Connector resolving provider configs by name.
///
/// Holds no per-resource state; it is safe to call once per reconcile.
pub struct ServiceConnector {
    configs: HashMap<String, ProviderConfig>,
    resolver: Arc<dyn CredentialResolver>,
    factory: Arc<dyn ServiceFactory>,
}

impl ServiceConnector {
    pub fn new(
        settings: ProviderSettings,
        resolver: Arc<dyn CredentialResolver>,
        factory: Arc<dyn ServiceFactory>,
    ) -> Self {
        let configs = settings
            .provider_configs
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        Self {
            configs,
            resolver,
            factory,
        }
    }
}

#[async_trait]
impl Connector for ServiceConnector {
    async fn connect(&self, resource: &UserResource) -> Result<ExternalClient, ConnectError> {
        let config = self
            .configs
            .get(&resource.provider_config_ref)
            .ok_or_else(|| {
                ConnectError::CredentialResolutionFailed(format!(
                    "cannot get ProviderConfig {}",
                    resource.provider_config_ref
                ))
            })?;

        let credentials = self.resolver.resolve(config).await?;
        debug!(
            "Connecting {} via provider config {} ({})",
            resource.name, config.name, config.endpoint
        );
        let service = self.factory.build(config, credentials)?;
        Ok(ExternalClient::new(service, config.endpoint.clone()))
    }
}
