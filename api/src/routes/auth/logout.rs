use actix_web::{http::header::USER_AGENT, web, HttpRequest, HttpResponse};
use wh_core::repositories::StudentRepository;
use wh_shared::ApiResponse;

use super::removal_cookie;
use crate::app::AppState;
use crate::middleware::client_ip;

/// Handler for POST /api/auth/logout
///
/// Public: a client with an expired access token must still be able to log
/// out. Tokens are stateless, so logging out only clears the refresh cookie;
/// tokens already issued stay valid until they expire.
pub async fn logout<R>(state: web::Data<AppState<R>>, req: HttpRequest) -> HttpResponse
where
    R: StudentRepository + 'static,
{
    tracing::info!(
        ip = %client_ip(&req),
        user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown"),
        "Logged out"
    );

    HttpResponse::Ok()
        .cookie(removal_cookie(&state.cookie))
        .json(ApiResponse::ok("Logged out successfully"))
}
