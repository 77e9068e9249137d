//! Response cache headers for authentication endpoints.
//!
//! Responses carrying tokens or profile data must never be served from a
//! browser or proxy cache, and login, refresh and logout additionally ask
//! the browser to drop whatever it already cached for the site.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap, HeaderName, HeaderValue},
    Error,
};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    task::{Context, Poll},
};
use uuid::Uuid;

pub const NO_STORE: &str = "no-cache, no-store, must-revalidate, private, max-age=0";

const LOGOUT_NO_STORE: &str = "no-cache, no-store, must-revalidate, private, max-age=0, no-transform";

/// Which set of cache headers to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never cache; used on profile and token verification
    NoCache,
    /// Drop cached auth data; used on login and refresh
    ClearAuth,
    /// Drop everything including cookies
    Logout,
}

/// Cache header middleware factory
#[derive(Debug, Clone, Copy)]
pub struct CacheControl {
    policy: CachePolicy,
}

impl CacheControl {
    pub fn no_cache() -> Self {
        Self {
            policy: CachePolicy::NoCache,
        }
    }

    pub fn clear_auth() -> Self {
        Self {
            policy: CachePolicy::ClearAuth,
        }
    }

    pub fn logout() -> Self {
        Self {
            policy: CachePolicy::Logout,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheControl
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CacheControlMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CacheControlMiddleware {
            service: Rc::new(service),
            policy: self.policy,
        }))
    }
}

pub struct CacheControlMiddleware<S> {
    service: Rc<S>,
    policy: CachePolicy,
}

impl<S, B> Service<ServiceRequest> for CacheControlMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let policy = self.policy;

        Box::pin(async move {
            let mut res = service.call(req).await?;
            apply_policy(policy, res.headers_mut());
            Ok(res)
        })
    }
}

/// Write the headers of `policy` into `headers`, replacing existing values
pub fn apply_policy(policy: CachePolicy, headers: &mut HeaderMap) {
    match policy {
        CachePolicy::NoCache => {
            apply_no_store(headers, "0");
            set(headers, HeaderName::from_static("surrogate-control"), "no-store");
            set(headers, header::LAST_MODIFIED, &http_date());
            set(headers, header::ETAG, &unique_etag(""));
            set(headers, HeaderName::from_static("x-response-time"), &Utc::now().to_rfc3339());
            set(headers, HeaderName::from_static("x-cache-control"), "no-cache-applied");
        }
        CachePolicy::ClearAuth => {
            apply_no_store(headers, "-1");
            set(headers, HeaderName::from_static("clear-site-data"), "\"cache\", \"storage\"");
            set(headers, HeaderName::from_static("x-cache-invalidate"), "auth-data");
        }
        CachePolicy::Logout => {
            apply_no_store(headers, "-1");
            set(headers, header::CACHE_CONTROL, LOGOUT_NO_STORE);
            set(
                headers,
                HeaderName::from_static("clear-site-data"),
                "\"cache\", \"storage\", \"cookies\"",
            );
            set(headers, HeaderName::from_static("x-cache-invalidate"), "all-user-data");
            set(headers, header::VARY, "*");
            set(headers, HeaderName::from_static("x-logout-timestamp"), &Utc::now().to_rfc3339());
        }
    }
}

/// `Cache-Control`, `Pragma` and `Expires` forbidding any caching
pub fn apply_no_store(headers: &mut HeaderMap, expires: &str) {
    set(headers, header::CACHE_CONTROL, NO_STORE);
    set(headers, header::PRAGMA, "no-cache");
    set(headers, header::EXPIRES, expires);
}

/// An ETag no two responses share, so conditional requests never match
pub fn unique_etag(prefix: &str) -> String {
    format!(
        "\"{}{}-{}\"",
        prefix,
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..9]
    )
}

pub fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub(crate) fn set(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
