//! MySQL-specific repository implementations
//!
//! Repositories here issue their statements through the
//! `ConnectionManager`, so they inherit its timeout and retry handling.

pub mod student_repository_impl;

// Re-export the MySQL implementations
pub use student_repository_impl::MySqlStudentRepository;
