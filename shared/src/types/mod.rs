//! Type definitions shared by the HTTP layer
//!
//! - `response` - the JSON envelope every endpoint returns

pub mod response;

pub use response::{ApiResponse, FieldError};
