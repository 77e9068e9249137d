use actix_web::HttpResponse;
use wh_core::domain::AuthenticatedSubject;
use wh_shared::ApiResponse;

use crate::dto::auth_dto::VerifyResponse;
use crate::middleware::AuthContext;

/// Handler for POST /api/auth/verify
///
/// The middleware has already verified the token; this echoes its subject.
pub async fn verify(auth: AuthContext) -> HttpResponse {
    let subject = AuthenticatedSubject::from(auth);
    HttpResponse::Ok().json(ApiResponse::success(
        "Access token is valid",
        VerifyResponse::from(subject),
    ))
}
