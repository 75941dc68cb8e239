//! ABOUTME: Bearer-token session resolution for API handlers
//! ABOUTME: Tokens are opaque here; the identity provider validates them

use crate::error::ApiError;
use actix_web::HttpRequest;
use halo_auth::{AuthService, AuthUser};
use tracing::debug;

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolve the request's bearer token to its user, or reject with 401.
/// Token validation is delegated to the identity provider; nothing about
/// the session is trusted locally.
pub async fn require_user(req: &HttpRequest, auth: &AuthService) -> Result<AuthUser, ApiError> {
    let token =
        bearer_token(req).ok_or_else(|| ApiError::unauthorized("Bearer token required"))?;

    match auth.current_user(token).await {
        Ok(user) => Ok(user),
        Err(e) => {
            debug!("session resolution failed: {}", e);
            Err(ApiError::unauthorized("Invalid or expired session"))
        }
    }
}
