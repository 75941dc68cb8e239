//! ABOUTME: Profile entity and update payload types
//! ABOUTME: Mirrors the user_profiles table exposed by the store

use serde::{Deserialize, Serialize};

/// A user's editable account metadata, one row per identity-provider
/// user id. `id` and `created_at` are immutable after provisioning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields a caller may change on a profile. Serialization skips unset
/// fields so a partial update only touches what the caller sent; `id`
/// and `created_at` are deliberately absent from this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_serialize_only_set_fields() {
        let changes = ProfileChanges {
            first_name: Some("Ada".to_string()),
            updated_at: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&changes).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["first_name"], "Ada");
        assert!(!obj.contains_key("last_name"));
        assert!(!obj.contains_key("id"));
    }

    #[test]
    fn profile_roundtrip_preserves_nullable_fields() {
        let raw = serde_json::json!({
            "id": "user-1",
            "first_name": null,
            "last_name": "Lovelace",
            "display_name": null,
            "avatar_url": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
        });

        let profile: UserProfile = serde_json::from_value(raw).unwrap();
        assert_eq!(profile.first_name, None);
        assert_eq!(profile.last_name.as_deref(), Some("Lovelace"));
    }
}
