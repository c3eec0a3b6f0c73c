//! External client: translates managed-resource specs into store records.

use std::collections::BTreeMap;
use std::sync::Arc;
use user_store::UserData;

use crate::clients::UserService;
use crate::error::ServiceError;
use crate::resource::UserSpec;

/// Details a consumer needs to reach the external user.
pub type ConnectionDetails = BTreeMap<String, String>;

/// The complete record the store should hold for `spec`.
///
/// Unset optional fields become empty strings; the record is always complete
/// because the store replaces rather than merges.
pub fn desired_record(spec: &UserSpec) -> UserData {
    UserData {
        id: spec.id.clone(),
        name: spec.name.clone().unwrap_or_default(),
        email: spec.email.clone().unwrap_or_default(),
        attributes: spec.attributes.clone(),
    }
}

/// Whether the observed record matches the desired state exactly.
pub fn is_up_to_date(spec: &UserSpec, actual: &UserData) -> bool {
    desired_record(spec) == *actual
}

/// Client bound to one store service, produced by a connector.
#[derive(Clone)]
pub struct ExternalClient {
    service: Arc<dyn UserService>,
    endpoint: String,
}

impl ExternalClient {
    pub fn new(service: Arc<dyn UserService>, endpoint: impl Into<String>) -> Self {
        Self {
            service,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connection_details(&self, user: &UserData) -> ConnectionDetails {
        let mut details = ConnectionDetails::new();
        details.insert("id".to_string(), user.id.clone());
        details.insert("email".to_string(), user.email.clone());
        details.insert("endpoint".to_string(), self.endpoint.clone());
        details
    }

    pub async fn get_external(&self, id: &str) -> Result<UserData, ServiceError> {
        self.service.get_user(id).await
    }

    pub async fn create_external(&self, spec: &UserSpec) -> Result<UserData, ServiceError> {
        self.service.create_user(&desired_record(spec)).await
    }

    pub async fn update_external(&self, spec: &UserSpec) -> Result<UserData, ServiceError> {
        self.service.update_user(&desired_record(spec)).await
    }

    pub async fn delete_external(&self, id: &str) -> Result<(), ServiceError> {
        self.service.delete_user(id).await
    }
}
