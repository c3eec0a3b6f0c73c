use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::store::{Result, StoreError};

/// A user record as held by the store.
///
/// The store keeps exactly what it was given: there are no server-assigned
/// fields, so a read after a write returns the written record unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct UserData {
    /// Unique identifier, immutable once created.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Provider-defined fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl UserData {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style helper for setting a provider-defined attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Check that `id` can name a user.
///
/// Blank IDs are rejected, and so are the dot segments `.` and `..`, which
/// cannot be carried as a single URL path segment.
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidArgument(
            "user ID must not be empty".to_string(),
        ));
    }
    if id == "." || id == ".." {
        return Err(StoreError::InvalidArgument(format!(
            "user ID '{}' is reserved",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("u1").is_ok());
        assert!(validate_id("a/b c").is_ok());
        assert!(validate_id("...").is_ok());
        for id in ["", "  ", ".", ".."] {
            assert!(
                matches!(validate_id(id), Err(StoreError::InvalidArgument(_))),
                "{:?} accepted",
                id
            );
        }
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let user: UserData = serde_json::from_str(r#"{"id": "u1"}"#).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "");
        assert_eq!(user.email, "");
        assert!(user.attributes.is_empty());
    }

    #[test]
    fn test_empty_attributes_are_not_serialized() {
        let json = serde_json::to_value(UserData::new("u1", "Ann", "ann@example.com")).unwrap();
        assert!(json.get("attributes").is_none());

        let json = serde_json::to_value(UserData::new("u1", "Ann", "").with_attribute("team", "infra"))
            .unwrap();
        assert_eq!(json["attributes"]["team"], "infra");
    }
}
