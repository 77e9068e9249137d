//! Application state and factory
//!
//! This module holds the shared application state and builds the Actix-web
//! application used by both the server binary and the integration tests.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    web, App, Error, HttpRequest, HttpResponse,
};
use tracing_actix_web::TracingLogger;
use wh_core::repositories::StudentRepository;
use wh_core::services::AuthService;
use wh_infra::database::ConnectionManager;
use wh_shared::config::{CookieConfig, ServerConfig};
use wh_shared::types::FieldError;
use wh_shared::{ApiResponse, Environment};

use crate::middleware::{create_cors, RateLimitConfig, RateLimiter};
use crate::routes::{self, health::ServiceInfo};

/// Rate limiters for the public authentication endpoints
#[derive(Clone)]
pub struct AuthRateLimits {
    pub login: RateLimiter,
    pub refresh: RateLimiter,
}

impl AuthRateLimits {
    /// Limits apply everywhere except development
    pub fn for_environment(environment: Environment, trust_proxy: bool) -> Self {
        let enabled = !environment.is_development();
        Self {
            login: RateLimiter::new(
                RateLimitConfig::login()
                    .enabled(enabled)
                    .trust_proxy(trust_proxy),
            ),
            refresh: RateLimiter::new(
                RateLimitConfig::refresh()
                    .enabled(enabled)
                    .trust_proxy(trust_proxy),
            ),
        }
    }
}

/// Application state shared by every worker
pub struct AppState<R>
where
    R: StudentRepository,
{
    pub auth_service: Arc<AuthService<R>>,
    pub connection_manager: Arc<ConnectionManager>,
    pub cookie: CookieConfig,
    pub server: ServerConfig,
    pub rate_limits: AuthRateLimits,
    pub info: ServiceInfo,
}

impl<R> AppState<R>
where
    R: StudentRepository,
{
    /// State with the defaults for `environment`
    pub fn new(
        auth_service: Arc<AuthService<R>>,
        connection_manager: Arc<ConnectionManager>,
        environment: Environment,
    ) -> Self {
        let server = ServerConfig::default();
        Self {
            auth_service,
            connection_manager,
            cookie: CookieConfig::for_environment(environment),
            rate_limits: AuthRateLimits::for_environment(environment, server.trust_proxy),
            server,
            info: ServiceInfo::new(environment),
        }
    }

    /// Also rebuilds the rate limiters, which depend on `trust_proxy`
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.rate_limits = AuthRateLimits::for_environment(self.info.environment, server.trust_proxy);
        self.server = server;
        self
    }

    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_rate_limits(mut self, rate_limits: AuthRateLimits) -> Self {
        self.rate_limits = rate_limits;
        self
    }
}

/// Create and configure the application with all dependencies
pub fn create_app<R>(
    state: web::Data<AppState<R>>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    R: StudentRepository + 'static,
{
    let cors = create_cors(&state.server);
    let manager = web::Data::from(Arc::clone(&state.connection_manager));
    let info = web::Data::new(state.info);
    let auth_state = state.clone();

    App::new()
        .app_data(state)
        .app_data(manager)
        .app_data(info)
        .app_data(web::JsonConfig::default().error_handler(json_error))
        // Middleware order: request logging outermost, then CORS
        .wrap(cors)
        .wrap(TracingLogger::default())
        .route("/", web::get().to(api_index))
        .service(web::scope("/health").configure(routes::health::configure))
        .service(
            web::scope("/api/auth")
                .configure(|cfg| routes::auth::configure::<R>(cfg, &auth_state)),
        )
        .default_service(web::route().to(not_found))
}

/// GET /, a short map of the API
async fn api_index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Wirahusada Backend API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "endpoints": {
            "auth": {
                "login": "POST /api/auth/login",
                "refresh": "POST /api/auth/refresh",
                "profile": "GET /api/auth/profile",
                "verify": "POST /api/auth/verify",
                "logout": "POST /api/auth/logout",
            },
            "health": {
                "basic": "GET /health",
                "database": "GET /health/database",
                "config": "GET /health/database/config",
                "detailed": "GET /health/detailed",
            }
        }
    }))
}

/// Default 404 handler
async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ApiResponse::error("Endpoint not found", "not_found").with_errors(vec![FieldError::new(
            "path",
            format!("{} {} not found", req.method(), req.path()),
        )]),
    )
}

/// Malformed JSON bodies get the regular error envelope
fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> Error {
    let response = HttpResponse::BadRequest().json(
        ApiResponse::error("Invalid request body", "invalid_body")
            .with_errors(vec![FieldError::new("body", err.to_string())]),
    );
    InternalError::from_response(err, response).into()
}
