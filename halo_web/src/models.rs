//! ABOUTME: Request and response models for the web API
//! ABOUTME: Validated inbound bodies plus OpenAPI-documented outputs

use halo_auth::{AuthUser, Session, SignInResponse, SignUpRequest};
use halo_profile::UpdateProfileRequest;
use halo_store::UserProfile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for account creation
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignUpBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<SignUpBody> for SignUpRequest {
    fn from(body: SignUpBody) -> Self {
        Self {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        }
    }
}

/// Request body for password sign-in
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignInBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for the password reset flow
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordBody {
    #[validate(email)]
    pub email: String,
}

/// Partial profile update. `id` and `created_at` are accepted here only
/// so mismatches can be rejected; neither is ever persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProfileBody {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<String>,
}

impl From<UpdateProfileBody> for UpdateProfileRequest {
    fn from(body: UpdateProfileBody) -> Self {
        Self {
            id: body.id,
            first_name: body.first_name,
            last_name: body.last_name,
            display_name: body.display_name,
            avatar_url: body.avatar_url,
            created_at: body.created_at,
        }
    }
}

/// Profile response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileInfo {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserProfile> for ProfileInfo {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            display_name: profile.display_name,
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Identity provider user as returned to API callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthUserInfo {
    pub id: String,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

impl From<AuthUser> for AuthUserInfo {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            refresh_token: session.refresh_token,
        }
    }
}

/// Response for successful sign-in
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInInfo {
    pub user: AuthUserInfo,
    pub session: SessionInfo,
}

impl From<SignInResponse> for SignInInfo {
    fn from(response: SignInResponse) -> Self {
        Self {
            user: response.user.into(),
            session: response.session.into(),
        }
    }
}

/// Query string for the batched profile lookup: `?ids=a,b,c`
#[derive(Debug, Deserialize)]
pub struct ProfilesQuery {
    pub ids: String,
}

impl ProfilesQuery {
    /// Split the comma-separated list, dropping empty segments so
    /// `?ids=a,,b` and trailing commas behave.
    pub fn user_ids(&self) -> Vec<String> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Standard error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
