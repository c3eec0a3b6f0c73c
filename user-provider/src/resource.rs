//! Managed user resources: the declared desired state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider config used when a resource names none.
pub const DEFAULT_PROVIDER_CONFIG: &str = "default";

fn default_provider_config() -> String {
    DEFAULT_PROVIDER_CONFIG.to_string()
}

/// Anything the controller can schedule.
pub trait ManagedResource {
    /// Stable scheduling key.
    fn key(&self) -> &str;
}

/// Desired attributes of a user in the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSpec {
    /// Store identifier of the user.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A managed user resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResource {
    /// Resource name, unique within a manifest.
    pub name: String,
    /// Provider config supplying the endpoint and credentials.
    #[serde(default = "default_provider_config")]
    pub provider_config_ref: String,
    /// Set when the external user should be removed.
    #[serde(default)]
    pub deletion_requested: bool,
    pub spec: UserSpec,
}

impl UserResource {
    pub fn new(name: impl Into<String>, spec: UserSpec) -> Self {
        Self {
            name: name.into(),
            provider_config_ref: default_provider_config(),
            deletion_requested: false,
            spec,
        }
    }

    /// Mark the resource for deletion.
    pub fn deleted(mut self) -> Self {
        self.deletion_requested = true;
        self
    }
}

impl ManagedResource for UserResource {
    fn key(&self) -> &str {
        &self.name
    }
}
