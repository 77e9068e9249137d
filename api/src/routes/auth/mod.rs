//! Authentication route handlers
//!
//! This module contains the student authentication endpoints:
//! - Login with NIM or name plus NRM
//! - Token refresh from the cookie or request body
//! - Profile lookup and access token verification
//! - Logout

pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod verify;

use std::sync::Arc;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header::USER_AGENT;
use actix_web::{web, HttpRequest};
use wh_core::repositories::StudentRepository;
use wh_shared::config::{CookieConfig, SameSitePolicy};

use crate::app::AppState;
use crate::middleware::{Authenticator, CacheControl, JwtAuth};

/// Register the `/api/auth` routes with their middleware
pub fn configure<R>(cfg: &mut web::ServiceConfig, state: &AppState<R>)
where
    R: StudentRepository + 'static,
{
    let authenticator: Arc<dyn Authenticator> = state.auth_service.clone();

    cfg.service(
        web::resource("/login")
            .wrap(CacheControl::clear_auth())
            .wrap(state.rate_limits.login.clone())
            .route(web::post().to(login::login::<R>)),
    )
    .service(
        web::resource("/refresh")
            .wrap(CacheControl::clear_auth())
            .wrap(state.rate_limits.refresh.clone())
            .route(web::post().to(refresh::refresh::<R>)),
    )
    .service(
        web::resource("/profile")
            .wrap(JwtAuth::new(Arc::clone(&authenticator)))
            .wrap(CacheControl::no_cache())
            .route(web::get().to(profile::profile::<R>)),
    )
    .service(
        web::resource("/verify")
            .wrap(JwtAuth::new(authenticator))
            .wrap(CacheControl::no_cache())
            .route(web::post().to(verify::verify)),
    )
    .service(
        web::resource("/logout")
            .wrap(CacheControl::logout())
            .route(web::post().to(logout::logout::<R>)),
    );
}

/// Native apps cannot read HttpOnly cookies, so they get the refresh token
/// in the body. Browsers identify themselves with `Mozilla` or `Chrome`.
pub fn is_mobile_client(req: &HttpRequest) -> bool {
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    !user_agent.contains("Mozilla") && !user_agent.contains("Chrome")
}

/// Cookie carrying a freshly issued refresh token
pub fn refresh_cookie(config: &CookieConfig, token: &str) -> Cookie<'static> {
    Cookie::build(config.name.clone(), token.to_string())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .path(config.path.clone())
        .max_age(CookieDuration::seconds(config.max_age))
        .finish()
}

/// Cookie that makes the browser forget the refresh token
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.name.clone(), "")
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .path(config.path.clone())
        .finish();
    cookie.make_removal();
    cookie
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
    }
}
