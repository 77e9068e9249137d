pub mod auth;
pub mod cache_control;
pub mod cors;
pub mod rate_limit;

pub use auth::{AuthContext, Authenticator, JwtAuth};
pub use cache_control::{CacheControl, CachePolicy};
pub use cors::create_cors;
pub use rate_limit::{client_ip, peer_ip, rate_limit_key, RateLimitConfig, RateLimitResult, RateLimiter};
