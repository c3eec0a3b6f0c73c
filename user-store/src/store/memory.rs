//! In-memory UserStore backed by a sharded KeyedStore.
//!
//! Entries live for the lifetime of the process only.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::record::{UserData, validate_id};

use super::error::{Result, StoreError};
use super::keyed::KeyedStore;
use super::traits::UserStore;

/// In-memory user store.
pub struct MemoryStore {
    users: KeyedStore<UserData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: KeyedStore::new(),
        }
    }

    /// Log rejected requests at the level their kind deserves.
    fn log_failure(op: &str, err: &StoreError) {
        match err {
            StoreError::NotFound(_) | StoreError::AlreadyExists(_) => debug!("{}: {}", op, err),
            _ => warn!("{}: {}", op, err),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<UserData>> {
        Ok(self.users.list().into_iter().map(|(_, u)| u).collect())
    }

    async fn get_user(&self, id: &str) -> Result<UserData> {
        debug!("GetUser request for ID: {}", id);
        validate_id(id)?;
        self.users
            .read(id)
            .inspect_err(|e| Self::log_failure("GetUser", e))
    }

    async fn create_user(&self, user: UserData) -> Result<UserData> {
        debug!("CreateUser request for ID: {}", user.id);
        validate_id(&user.id)?;

        let id = user.id.clone();
        let created = self
            .users
            .create(&id, user)
            .inspect_err(|e| Self::log_failure("CreateUser", e))?;
        info!("User with ID: {} created", id);
        Ok(created)
    }

    async fn update_user(&self, user: UserData) -> Result<UserData> {
        debug!("UpdateUser request for ID: {}", user.id);
        validate_id(&user.id)?;

        let id = user.id.clone();
        let updated = self
            .users
            .update(&id, user)
            .inspect_err(|e| Self::log_failure("UpdateUser", e))?;
        info!("User with ID: {} updated", id);
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        debug!("DeleteUser request for ID: {}", id);
        validate_id(id)?;
        self.users
            .delete(id)
            .inspect_err(|e| Self::log_failure("DeleteUser", e))?;
        info!("User with ID: {} deleted", id);
        Ok(())
    }
}
