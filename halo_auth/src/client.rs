//! ABOUTME: HTTP client for the identity provider's auth API
//! ABOUTME: GoTrue-style endpoints: signup, token, logout, recover, user

use crate::types::{AuthUser, Session, SignInRequest, SignUpRequest, SignInResponse};
use halo_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Client for the identity provider. Stateless; sessions live entirely
/// on the provider side and are referenced by bearer token.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    user: AuthUser,
}

/// Provider error body; field name varies by endpoint
#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(alias = "error_description", alias = "msg", alias = "message")]
    error: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("halo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Identity(format!("Failed to build identity client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Create a new account. Name fields travel as signup metadata so
    /// provisioning can seed the profile row.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthUser> {
        debug!(email = %request.email, "signing up user");

        let body = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "first_name": request.first_name,
                "last_name": request.last_name,
            },
        });

        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("Signup request failed: {}", e)))?;

        Self::parse(response, "signup").await
    }

    /// Password sign-in, returning the user and a fresh session.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInResponse> {
        debug!(email = %request.email, "signing in user");

        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("Signin request failed: {}", e)))?;

        let token: TokenResponse = Self::parse(response, "signin").await?;
        Ok(SignInResponse {
            user: token.user,
            session: Session {
                access_token: token.access_token,
                token_type: token.token_type,
                expires_in: token.expires_in,
                refresh_token: token.refresh_token,
            },
        })
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        debug!("signing out session");

        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("Signout request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::provider_error(response, "signout").await)
        }
    }

    /// Trigger the out-of-band password reset flow for an email.
    pub async fn reset_password(&self, email: &str) -> Result<()> {
        debug!("requesting password reset");

        let response = self
            .client
            .post(self.endpoint("recover"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| Error::Identity(format!("Reset request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::provider_error(response, "reset").await)
        }
    }

    /// Resolve a bearer token to its user. The route layer uses this to
    /// authenticate profile requests.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Identity(format!("User lookup failed: {}", e)))?;

        Self::parse(response, "user lookup").await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        op: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::provider_error(response, op).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::Identity(format!("Malformed {} response: {}", op, e)))
    }

    async fn provider_error(response: reqwest::Response, op: &str) -> Error {
        let status = response.status();
        let detail = response
            .json::<ProviderError>()
            .await
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| format!("status {}", status));
        Error::Identity(format!("{} failed: {}", op, detail))
    }
}
