//! ABOUTME: Auth facade over the identity provider
//! ABOUTME: Thin pass-through; no local session or credential state

pub mod client;
pub mod types;

pub use client::IdentityClient;
pub use types::{AuthUser, Session, SignInRequest, SignInResponse, SignUpRequest};

use halo_core::Result;
use tracing::info;

/// Facade over [`IdentityClient`]. Holds no state of its own; every
/// operation is a pass-through and provider errors surface unchanged.
#[derive(Debug, Clone)]
pub struct AuthService {
    identity: IdentityClient,
}

impl AuthService {
    pub fn new(identity: IdentityClient) -> Self {
        Self { identity }
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthUser> {
        let user = self.identity.sign_up(request).await?;
        info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInResponse> {
        let signed_in = self.identity.sign_in(request).await?;
        info!(user_id = %signed_in.user.id, "user signed in");
        Ok(signed_in)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.identity.sign_out(access_token).await
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        self.identity.reset_password(email).await
    }

    /// Resolve a bearer token to its user.
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser> {
        self.identity.get_user(access_token).await
    }
}
