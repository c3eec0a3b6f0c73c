//! UserStore trait definition.
//!
//! Abstracts the storage backend so handlers and in-process clients work
//! with domain objects only.

use async_trait::async_trait;

use crate::record::UserData;

use super::error::Result;

/// Store trait for user operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// List all users, ordered by ID.
    async fn list_users(&self) -> Result<Vec<UserData>>;

    /// Get a user by ID. Fails with `NotFound` if absent.
    async fn get_user(&self, id: &str) -> Result<UserData>;

    /// Create a new user. Fails with `AlreadyExists` if the ID is taken.
    async fn create_user(&self, user: UserData) -> Result<UserData>;

    /// Replace an existing user. Fails with `NotFound` if absent.
    async fn update_user(&self, user: UserData) -> Result<UserData>;

    /// Delete a user. Fails with `NotFound` if absent.
    async fn delete_user(&self, id: &str) -> Result<()>;
}
