//! Provider configuration and desired-state manifest files.
//!
//! Both are JSON documents:
//!
//! ```json
//! {
//!   "provider_configs": [
//!     {
//!       "name": "default",
//!       "endpoint": "http://[::1]:50051",
//!       "credentials": { "source": "env", "var": "USER_STORE_TOKEN" }
//!     }
//!   ]
//! }
//! ```
//!
//! ```json
//! { "users": [ { "name": "ann", "spec": { "id": "u1", "name": "Ann" } } ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resource::UserResource;

/// Errors loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
}

/// Where a provider config's credentials come from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CredentialsSource {
    /// No credentials.
    #[default]
    None,
    /// Token given inline.
    Inline { token: String },
    /// Token read from an environment variable.
    Env { var: String },
    /// Token read from a file.
    File { path: PathBuf },
}

/// Connection settings shared by a class of managed resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub credentials: CredentialsSource,
}

/// Contents of the provider config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub provider_configs: Vec<ProviderConfig>,
}

/// Desired users to keep converged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub users: Vec<UserResource>,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

impl ProviderSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = load_json(path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unique(
            "provider config",
            self.provider_configs.iter().map(|c| c.name.as_str()),
        )
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let manifest: Self = load_json(path)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unique("resource", self.users.iter().map(|u| u.name.as_str()))
    }
}
