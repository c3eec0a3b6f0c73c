//! Clients for the user store service.
//!
//! Two bindings implement the same RPC-shaped surface:
//! - http: the user-store REST API over the network
//! - local: an in-process `UserStore`

pub mod http;
pub mod local;

use async_trait::async_trait;
use user_store::UserData;

use crate::error::ServiceError;

pub use http::HttpUserService;
pub use local::LocalUserService;

/// Store service surface consumed by the external client.
///
/// Implementations do not retry; every failure carries a status code.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<UserData, ServiceError>;

    async fn create_user(&self, user: &UserData) -> Result<UserData, ServiceError>;

    async fn update_user(&self, user: &UserData) -> Result<UserData, ServiceError>;

    async fn delete_user(&self, id: &str) -> Result<(), ServiceError>;
}
