//! ABOUTME: Wire types for the identity provider's auth endpoints
//! ABOUTME: Request/response shapes only; no session state lives here

use serde::{Deserialize, Serialize};

/// New-account request. Optional name fields travel as user metadata
/// and seed the provisioned profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// The identity provider's view of a user. Profiles are keyed by this
/// `id`; halo never allocates user ids itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Bearer session minted by the provider on sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Successful sign-in: the user plus their new session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user: AuthUser,
    pub session: Session,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_omits_absent_names() {
        let req = SignUpRequest {
            email: "a@example.com".into(),
            password: "secret".into(),
            first_name: None,
            last_name: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(!json.as_object().unwrap().contains_key("first_name"));
    }
}
