//! In-process binding to a `UserStore`.

use async_trait::async_trait;
use std::sync::Arc;
use user_store::{StoreError, UserData, UserStore};

use super::UserService;
use crate::error::{ServiceError, StatusCode};

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            StoreError::NotFound(_) => StatusCode::NotFound,
            StoreError::AlreadyExists(_) => StatusCode::AlreadyExists,
            StoreError::Unavailable(_) => StatusCode::Unavailable,
            StoreError::InvalidArgument(_) | StoreError::Internal(_) => StatusCode::Unknown,
        };
        ServiceError::new(code, e.to_string())
    }
}

/// Client for a store living in the same process.
#[derive(Clone)]
pub struct LocalUserService {
    store: Arc<dyn UserStore>,
}

impl LocalUserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for LocalUserService {
    async fn get_user(&self, id: &str) -> Result<UserData, ServiceError> {
        Ok(self.store.get_user(id).await?)
    }

    async fn create_user(&self, user: &UserData) -> Result<UserData, ServiceError> {
        Ok(self.store.create_user(user.clone()).await?)
    }

    async fn update_user(&self, user: &UserData) -> Result<UserData, ServiceError> {
        Ok(self.store.update_user(user.clone()).await?)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.store.delete_user(id).await?)
    }
}
