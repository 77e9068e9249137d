//! JWT authentication middleware for protecting API endpoints.
//!
//! The middleware reads the `Authorization: Bearer <token>` header, verifies
//! the access token and injects an [`AuthContext`] into the request. Every
//! response it touches, accepted or rejected, is marked uncacheable; accepted
//! responses also carry the student's NRM in `X-User-Context` so caches that
//! ignore `Cache-Control` still keep users apart.

use actix_web::{
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header::{self, HeaderName, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};
use wh_core::domain::{AuthenticatedSubject, TokenType};
use wh_core::errors::{RejectionReason, TokenError};
use wh_core::repositories::StudentRepository;
use wh_core::services::AuthService;
use wh_shared::types::FieldError;
use wh_shared::ApiResponse;

use super::cache_control::{apply_no_store, http_date, set, unique_etag};
use super::rate_limit::client_ip;
use crate::handlers::error_handler::token_status;

/// Authenticated student injected into requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub nrm: String,
    pub nim: String,
    pub namam: String,
    pub token_type: TokenType,
}

impl From<AuthenticatedSubject> for AuthContext {
    fn from(subject: AuthenticatedSubject) -> Self {
        Self {
            nrm: subject.nrm,
            nim: subject.nim,
            namam: subject.namam,
            token_type: subject.token_type,
        }
    }
}

impl From<AuthContext> for AuthenticatedSubject {
    fn from(context: AuthContext) -> Self {
        Self {
            nrm: context.nrm,
            nim: context.nim,
            namam: context.namam,
            token_type: context.token_type,
        }
    }
}

/// Verifies an `Authorization` header value
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedSubject, TokenError>;
}

impl<R: StudentRepository> Authenticator for AuthService<R> {
    fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedSubject, TokenError> {
        AuthService::authenticate(self, header)
    }
}

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    authenticator: Arc<dyn Authenticator>,
}

impl JwtAuth {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            authenticator: Arc::clone(&self.authenticator),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    authenticator: Arc<dyn Authenticator>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let authenticator = Arc::clone(&self.authenticator);

        Box::pin(async move {
            let outcome = {
                let header = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                authenticator.authenticate(header)
            };

            match outcome {
                Ok(subject) => {
                    let nrm = subject.nrm.clone();
                    req.extensions_mut().insert(AuthContext::from(subject));

                    let mut res = service.call(req).await?;
                    let headers = res.headers_mut();
                    apply_no_store(headers, "0");
                    set(headers, HeaderName::from_static("x-auth-middleware"), "active");
                    set(headers, HeaderName::from_static("x-user-context"), &nrm);
                    set(headers, header::VARY, "Authorization, X-User-Context");
                    Ok(res.map_into_left_body())
                }
                Err(error) => {
                    tracing::warn!(
                        reason = error.rejection().as_str(),
                        error = %error,
                        ip = %client_ip(req.request()),
                        user_agent = user_agent(req.request()),
                        path = req.path(),
                        "Authentication failed"
                    );
                    let response = rejection_response(&error);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Response for a request whose access token was not accepted
pub fn rejection_response(error: &TokenError) -> HttpResponse {
    let reason = error.rejection();
    let mut response = match reason {
        RejectionReason::TokenMissing => {
            let body = ApiResponse::error("Access token required", reason.as_str()).with_errors(
                vec![FieldError::new(
                    "authorization",
                    "Authorization header with Bearer token is required",
                )],
            );
            let mut response = HttpResponse::Unauthorized().json(body);
            set(
                response.headers_mut(),
                HeaderName::from_static("x-auth-error"),
                "token-missing",
            );
            response
        }
        _ => {
            let message = error.client_message();
            let body = ApiResponse::error(message.clone(), reason.as_str())
                .with_errors(vec![FieldError::new("authorization", message)]);
            let mut response = HttpResponse::build(token_status(error)).json(body);
            let headers = response.headers_mut();
            set(headers, HeaderName::from_static("x-auth-error"), reason.as_str());
            set(headers, HeaderName::from_static("x-token-status"), "failed");
            set(headers, header::ETAG, &unique_etag("auth-error-"));
            response
        }
    };

    let headers = response.headers_mut();
    apply_no_store(headers, "0");
    set(headers, HeaderName::from_static("x-auth-middleware"), "active");
    set(headers, header::VARY, "Authorization");
    set(headers, header::LAST_MODIFIED, &http_date());
    response
}

fn user_agent(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}
