//! CORS configuration for browser clients.
//!
//! Credentials are allowed so the browser sends the refresh token cookie.
//! Any `http://localhost:<port>` origin is accepted for local front-end
//! development, together with the origins listed in the server config.
//! Requests without an `Origin` header (mobile apps, curl) are not CORS
//! requests and pass through untouched.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use wh_shared::ServerConfig;

const PREFLIGHT_MAX_AGE_SECS: usize = 3600;

/// Creates the CORS middleware for the configured origins
pub fn create_cors(config: &ServerConfig) -> Cors {
    let configured = config.allowed_origins.clone();
    tracing::info!(origins = ?configured, "Configuring CORS");

    Cors::default()
        .allowed_origin_fn(move |origin, _head| {
            origin
                .to_str()
                .map(|origin| is_allowed_origin(origin, &configured))
                .unwrap_or(false)
        })
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(PREFLIGHT_MAX_AGE_SECS)
}

/// Configured origins match exactly; localhost matches on any numeric port
pub fn is_allowed_origin(origin: &str, configured: &[String]) -> bool {
    if configured.iter().any(|allowed| allowed == origin) {
        return true;
    }

    origin
        .strip_prefix("http://localhost:")
        .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as atest;
    use actix_web::{web, App, HttpResponse};

    #[test]
    fn test_localhost_any_port() {
        assert!(is_allowed_origin("http://localhost:3000", &[]));
        assert!(is_allowed_origin("http://localhost:54128", &[]));
        assert!(!is_allowed_origin("http://localhost:", &[]));
        assert!(!is_allowed_origin("http://localhost:80.evil.com", &[]));
        assert!(!is_allowed_origin("https://localhost:3000", &[]));
    }

    #[test]
    fn test_configured_origins() {
        let configured = vec!["https://portal.wirahusada.ac.id".to_string()];
        assert!(is_allowed_origin("https://portal.wirahusada.ac.id", &configured));
        assert!(!is_allowed_origin("https://evil.example", &configured));
    }

    #[actix_web::test]
    async fn test_credentials_allowed_for_localhost() {
        let app = atest::init_service(
            App::new()
                .wrap(create_cors(&ServerConfig::default()))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = atest::TestRequest::get()
            .uri("/")
            .insert_header((header::ORIGIN, "http://localhost:8080"))
            .to_request();
        let res = atest::call_service(&app, req).await;

        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:8080")
        );
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|v| v.to_str().ok()),
            Some("true")
        );
    }
}
