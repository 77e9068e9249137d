use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;
use wh_core::domain::LoginOutcome;
use wh_core::repositories::StudentRepository;
use wh_shared::ApiResponse;

use super::{is_mobile_client, refresh_cookie};
use crate::app::AppState;
use crate::dto::auth_dto::{field_errors, LoginRequest, LoginResponse};
use crate::handlers::error_handler::handle_domain_error;
use crate::middleware::client_ip;

/// Handler for POST /api/auth/login
///
/// Students log in with their NIM or full name plus their NRM.
///
/// # Request Body
///
/// ```json
/// {
///     "namam_nim": "string",
///     "nrm": "string"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// The access token and profile in the body, the refresh token as an
/// HttpOnly cookie. Mobile clients also get `refreshToken` in the body.
///
/// ## Errors
/// - 400 Bad Request: Input validation failed
/// - 401 Unauthorized: No student matches the credentials
/// - 429 Too Many Requests: Login rate limit exceeded
/// - 503/504: The student database is unavailable
pub async fn login<R>(
    state: web::Data<AppState<R>>,
    req: HttpRequest,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    R: StudentRepository + 'static,
{
    let request = request.into_inner().trimmed();
    if let Err(errors) = request.validate() {
        let errors = field_errors(&errors);
        tracing::warn!(
            ip = %client_ip(&req),
            path = req.path(),
            fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
            "Input validation failed"
        );
        return HttpResponse::BadRequest().json(
            ApiResponse::error("Input validation failed", "validation_error").with_errors(errors),
        );
    }

    match state
        .auth_service
        .login(&request.namam_nim, &request.nrm)
        .await
    {
        Ok(LoginOutcome {
            tokens,
            student,
            expires_in,
        }) => {
            let mobile = is_mobile_client(&req);
            tracing::info!(nrm = %student.nrm, nim = %student.nim, mobile, "Login successful");

            let cookie = refresh_cookie(&state.cookie, &tokens.refresh_token);
            let body = LoginResponse {
                access_token: tokens.access_token,
                user: student.into(),
                refresh_token: mobile.then_some(tokens.refresh_token),
                expires_in,
            };

            HttpResponse::Ok()
                .cookie(cookie)
                .json(ApiResponse::success("Login successful", body))
        }
        Err(error) => handle_domain_error(error),
    }
}
