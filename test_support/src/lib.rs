//! ABOUTME: Shared testing utilities and helper functions
//! ABOUTME: Common test fixtures and builders for all crates

use serde_json::{json, Value};

/// Simple test helper function to demonstrate cross-crate testing
pub fn create_test_id() -> String {
    "test-id-123".to_string()
}

/// Fresh unique user id for tests that need isolation between runs
pub fn unique_user_id() -> String {
    format!("user-{}", ulid::Ulid::new())
}

/// Profile row as the store wire format returns it
pub fn profile_json(id: &str, first_name: &str) -> Value {
    json!({
        "id": id,
        "first_name": first_name,
        "last_name": null,
        "display_name": null,
        "avatar_url": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
    })
}

/// Profile row with every column populated
pub fn full_profile_json(id: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "display_name": "ada",
        "avatar_url": "https://example.com/ada.png",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_differ() {
        assert_ne!(unique_user_id(), unique_user_id());
    }

    #[test]
    fn profile_json_shape() {
        let row = profile_json("u1", "Ada");
        assert_eq!(row["id"], "u1");
        assert_eq!(row["first_name"], "Ada");
        assert!(row["last_name"].is_null());
    }
}
