//! ABOUTME: Auth endpoints: signup, login, logout, password reset
//! ABOUTME: Thin translation layer over the auth facade

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AuthUserInfo, ResetPasswordBody, SignInBody, SignInInfo, SignUpBody,
};
use crate::session::bearer_token;
use crate::AppState;
use actix_web::{post, web, HttpRequest, HttpResponse};
use halo_auth::SignInRequest;
use validator::Validate;

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignUpBody,
    responses(
        (status = 201, description = "Account created", body = AuthUserInfo),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Provider rejected the signup", body = ErrorResponse),
    )
)]
#[post("/signup")]
pub async fn sign_up(
    state: web::Data<AppState>,
    body: web::Json<SignUpBody>,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let user = state.auth.sign_up(&body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(AuthUserInfo::from(user)))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = SignInBody,
    responses(
        (status = 200, description = "Signed in", body = SignInInfo),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<SignInBody>,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let body = body.into_inner();
    let signed_in = state
        .auth
        .sign_in(&SignInRequest {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(HttpResponse::Ok().json(SignInInfo::from(signed_in)))
}

/// Revoke the caller's session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    )
)]
#[post("/logout")]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let token = bearer_token(&req).ok_or_else(|| ApiError::unauthorized("Bearer token required"))?;

    state.auth.sign_out(token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Start the out-of-band password reset flow
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordBody,
    responses(
        (status = 204, description = "Reset email requested"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
#[post("/reset-password")]
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordBody>,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    state.auth.reset_password(&body.email).await?;
    Ok(HttpResponse::NoContent().finish())
}
