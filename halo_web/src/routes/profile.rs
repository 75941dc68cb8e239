//! ABOUTME: Profile endpoints: single read, partial update, batched read
//! ABOUTME: All handlers resolve the caller through their bearer session

use crate::error::{ApiError, ApiResult};
use crate::models::{ProfileInfo, ProfilesQuery, UpdateProfileBody};
use crate::session::require_user;
use crate::AppState;
use actix_web::{get, patch, web, HttpRequest, HttpResponse};
use tracing::debug;

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = ProfileInfo),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "No profile for this user", body = ErrorResponse),
    )
)]
#[get("/profile")]
pub async fn get_profile(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = require_user(&req, &state.auth).await?;

    match state.profiles.get_profile(&user.id).await? {
        Some(profile) => Ok(HttpResponse::Ok().json(ProfileInfo::from(profile))),
        None => Err(ApiError::not_found(format!(
            "No profile for user {}",
            user.id
        ))),
    }
}

/// Update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/api/profile",
    tag = "profile",
    security(("bearer" = [])),
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "The updated profile", body = ProfileInfo),
        (status = 400, description = "Rejected update", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    )
)]
#[patch("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateProfileBody>,
) -> ApiResult<HttpResponse> {
    let user = require_user(&req, &state.auth).await?;
    debug!(user_id = %user.id, "profile update requested");

    let updated = state
        .profiles
        .update_profile(&user.id, body.into_inner().into())
        .await
        .map_err(|e| match e {
            // An update against a missing row is a caller problem at
            // this layer, not a lookup that happened to miss.
            halo_core::Error::NotFound(_) => {
                ApiError::bad_request("Profile update was not persisted")
            }
            other => ApiError::from(other),
        })?;

    Ok(HttpResponse::Ok().json(ProfileInfo::from(updated)))
}

/// Batched profile lookup by id list
#[utoipa::path(
    get,
    path = "/api/profiles",
    tag = "profile",
    security(("bearer" = [])),
    params(
        ("ids" = String, Query, description = "Comma-separated user ids"),
    ),
    responses(
        (status = 200, description = "Profiles in request order", body = [ProfileInfo]),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    )
)]
#[get("/profiles")]
pub async fn get_profiles(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ProfilesQuery>,
) -> ApiResult<HttpResponse> {
    require_user(&req, &state.auth).await?;

    let profiles = state.profiles.get_profiles(&query.user_ids()).await?;
    let infos: Vec<ProfileInfo> = profiles.into_iter().map(ProfileInfo::from).collect();
    Ok(HttpResponse::Ok().json(infos))
}
