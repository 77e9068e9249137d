use actix_web::{web, HttpRequest, HttpResponse};
use wh_core::repositories::StudentRepository;
use wh_shared::types::FieldError;
use wh_shared::ApiResponse;

use super::{is_mobile_client, refresh_cookie, removal_cookie};
use crate::app::AppState;
use crate::dto::auth_dto::{RefreshRequest, RefreshResponse};
use crate::handlers::error_handler::error_response;
use crate::middleware::client_ip;

/// Handler for POST /api/auth/refresh
///
/// Exchanges a refresh token for a new pair. Browsers send the token as the
/// `refreshToken` cookie; mobile apps send `{"refreshToken": "..."}`. The
/// cookie wins when both are present.
///
/// Any failure clears the cookie so the client falls back to a full login.
pub async fn refresh<R>(
    state: web::Data<AppState<R>>,
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> HttpResponse
where
    R: StudentRepository + 'static,
{
    let presented = req
        .cookie(&state.cookie.name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| body.and_then(|body| body.into_inner().refresh_token));

    match state.auth_service.refresh_tokens(presented.as_deref()).await {
        Ok(tokens) => {
            let mobile = is_mobile_client(&req);
            let cookie = refresh_cookie(&state.cookie, &tokens.refresh_token);
            let body = RefreshResponse {
                access_token: tokens.access_token,
                refresh_token: mobile.then_some(tokens.refresh_token),
                expires_in: state.auth_service.token_service().access_token_expires_in(),
            };

            HttpResponse::Ok()
                .cookie(cookie)
                .json(ApiResponse::success("Tokens refreshed successfully", body))
        }
        Err(error) => {
            tracing::warn!(
                reason = error.reason(),
                ip = %client_ip(&req),
                "Token refresh rejected"
            );
            let mut response = error_response(
                error,
                vec![FieldError::new("refreshToken", "Please login again")],
            );
            if let Err(err) = response.add_cookie(&removal_cookie(&state.cookie)) {
                tracing::error!(error = %err, "Failed to clear refresh token cookie");
            }
            response
        }
    }
}
