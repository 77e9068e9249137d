use actix_web::{web, HttpResponse};
use wh_core::repositories::StudentRepository;
use wh_shared::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::StudentProfile;
use crate::handlers::error_handler::handle_domain_error;
use crate::middleware::AuthContext;

/// Handler for GET /api/auth/profile
///
/// Requires a valid access token. The profile is read from the database on
/// every call rather than from the token claims.
pub async fn profile<R>(state: web::Data<AppState<R>>, auth: AuthContext) -> HttpResponse
where
    R: StudentRepository + 'static,
{
    match state.auth_service.get_profile(&auth.nrm).await {
        Ok(student) => HttpResponse::Ok().json(ApiResponse::success(
            "Profile retrieved successfully",
            StudentProfile::from(student),
        )),
        Err(error) => handle_domain_error(error),
    }
}
