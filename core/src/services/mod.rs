//! Business services containing domain logic and use cases.

pub mod auth;
pub mod retry;
pub mod token;

// Re-export commonly used types
pub use auth::AuthService;
pub use retry::{with_retry, Attempted, BackoffStrategy, RetryError, RetryPolicy};
pub use token::{extract_bearer_token, TokenService, TokenServiceConfig};
