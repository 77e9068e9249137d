//! Rate limiting middleware for authentication endpoints
//!
//! Fixed windows per client IP, kept in process memory. Each limiter owns its
//! own table, so login and refresh attempts are counted separately.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, RETRY_AFTER},
    Error, HttpRequest, HttpResponse,
};
use dashmap::DashMap;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};
use wh_shared::types::FieldError;
use wh_shared::ApiResponse;

use super::cache_control::set;

/// Sweep expired windows once the table grows past this many clients
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    pub window: Duration,
    /// Message of the 429 response
    pub message: String,
    /// Entry for the `errors` list of the 429 response
    pub detail: String,
    pub enabled: bool,
    /// Key clients by proxy headers instead of the socket peer
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    /// Login attempts: 5 per 15 minutes
    pub fn login() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(15 * 60),
            message: "Too many login attempts, please try again later".to_string(),
            detail: "Rate limit exceeded".to_string(),
            enabled: true,
            trust_proxy: false,
        }
    }

    /// Token refreshes: 10 per 15 minutes
    pub fn refresh() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(15 * 60),
            message: "Too many refresh attempts, please try again later".to_string(),
            detail: "Refresh rate limit exceeded".to_string(),
            enabled: true,
            trust_proxy: false,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_after: Duration,
    },
    Denied {
        limit: u32,
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

struct RateLimitState {
    windows: DashMap<String, Window>,
    config: RateLimitConfig,
}

/// Rate limiter middleware factory
///
/// Clones share the same counters, so one limiter can be handed to every
/// worker's app instance.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<RateLimitState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(RateLimitState {
                windows: DashMap::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.state.config
    }

    pub fn is_enabled(&self) -> bool {
        self.state.config.enabled
    }

    /// Count a request from `client`
    pub fn check(&self, client: &str) -> RateLimitResult {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitResult {
        let config = &self.state.config;
        if self.state.windows.len() > SWEEP_THRESHOLD {
            self.state
                .windows
                .retain(|_, window| now.saturating_duration_since(window.started) < config.window);
        }

        let mut entry = self
            .state
            .windows
            .entry(client.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
            });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.started) >= config.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = config
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count >= config.max_requests {
            return RateLimitResult::Denied {
                limit: config.max_requests,
                retry_after: reset_after,
            };
        }

        window.count += 1;
        RateLimitResult::Allowed {
            limit: config.max_requests,
            remaining: config.max_requests - window.count,
            reset_after,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimiterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service: Rc::new(service),
            limiter: self.clone(),
        }))
    }
}

/// Rate limiter middleware service
pub struct RateLimiterMiddleware<S> {
    service: Rc<S>,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
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
        let limiter = self.limiter.clone();

        Box::pin(async move {
            if !limiter.is_enabled() {
                return Ok(service.call(req).await?.map_into_left_body());
            }

            let ip = rate_limit_key(req.request(), limiter.config().trust_proxy);
            match limiter.check(&ip) {
                RateLimitResult::Allowed {
                    limit,
                    remaining,
                    reset_after,
                } => {
                    let mut res = service.call(req).await?;
                    let headers = res.headers_mut();
                    set(headers, HeaderName::from_static("ratelimit-limit"), &limit.to_string());
                    set(
                        headers,
                        HeaderName::from_static("ratelimit-remaining"),
                        &remaining.to_string(),
                    );
                    set(
                        headers,
                        HeaderName::from_static("ratelimit-reset"),
                        &whole_seconds(reset_after).to_string(),
                    );
                    Ok(res.map_into_left_body())
                }
                RateLimitResult::Denied { limit, retry_after } => {
                    tracing::warn!(
                        ip = %ip,
                        path = req.path(),
                        limit,
                        "Rate limit exceeded"
                    );
                    let response = rejection(limiter.config(), limit, retry_after);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

fn rejection(config: &RateLimitConfig, limit: u32, retry_after: Duration) -> HttpResponse {
    let seconds = whole_seconds(retry_after).to_string();
    let body = ApiResponse::error(config.message.clone(), "rate_limit_exceeded")
        .with_errors(vec![FieldError::new("rateLimit", config.detail.clone())]);

    HttpResponse::TooManyRequests()
        .insert_header((RETRY_AFTER, seconds.clone()))
        .insert_header(("RateLimit-Limit", limit.to_string()))
        .insert_header(("RateLimit-Remaining", "0"))
        .insert_header(("RateLimit-Reset", seconds))
        .json(body)
}

/// Round up so clients never retry a moment too early
fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Bucket key for a request
///
/// Proxy headers are client controlled, so they only count behind a trusted
/// proxy; otherwise every request is keyed by its socket peer.
pub fn rate_limit_key(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        client_ip(req)
    } else {
        peer_ip(req)
    }
}

/// Socket peer address without the port
pub fn peer_ip(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client address for logs, preferring proxy headers over the socket peer
pub fn client_ip(req: &HttpRequest) -> String {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // First hop is the original client
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.to_string();
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}
