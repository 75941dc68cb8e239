//! ABOUTME: Web API layer wiring profile and auth services into actix-web
//! ABOUTME: Provides REST endpoints and OpenAPI documentation

use actix_web::{web, App, HttpResponse, HttpServer};
use halo_auth::AuthService;
use halo_core::Result;
use halo_profile::ProfileService;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod models;
pub mod routes;
pub mod session;

use routes::{auth as auth_routes, profile as profile_routes};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: ProfileService,
    pub auth: AuthService,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        auth_routes::sign_up,
        auth_routes::login,
        auth_routes::logout,
        auth_routes::reset_password,
        profile_routes::get_profile,
        profile_routes::update_profile,
        profile_routes::get_profiles,
    ),
    components(
        schemas(
            models::SignUpBody,
            models::SignInBody,
            models::ResetPasswordBody,
            models::UpdateProfileBody,
            models::ProfileInfo,
            models::AuthUserInfo,
            models::SessionInfo,
            models::SignInInfo,
            models::ErrorResponse,
        ),
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "profile", description = "Profile endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main web application service factory
pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(actix_web::middleware::Logger::default())
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .service(auth_routes::sign_up)
                        .service(auth_routes::login)
                        .service(auth_routes::logout)
                        .service(auth_routes::reset_password),
                )
                .service(profile_routes::get_profile)
                .service(profile_routes::update_profile)
                .service(profile_routes::get_profiles),
        )
        .route(
            "/health",
            web::get().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({
                    "status": "healthy",
                    "version": env!("CARGO_PKG_VERSION"),
                }))
            }),
        )
}

/// Start the web server
pub async fn start_server(bind_addr: &str, state: AppState) -> Result<()> {
    tracing::info!("Starting web server on {}", bind_addr);

    HttpServer::new(move || create_app(state.clone()))
        .bind(bind_addr)
        .map_err(|e| halo_core::Error::Config(format!("Failed to bind web server: {}", e)))?
        .run()
        .await
        .map_err(|e| halo_core::Error::Config(format!("Web server error: {}", e)))?;

    Ok(())
}
