//! Login input validation rules

use once_cell::sync::Lazy;
use regex::Regex;

/// Letters, digits, whitespace, dots, apostrophes and hyphens
static NAMAM_NIM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s.'-]+$").expect("namam_nim pattern compiles"));

/// Upper-case letters, digits and hyphens
static NRM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9\-]+$").expect("nrm pattern compiles"));

pub const NAMAM_NIM_LENGTH: (usize, usize) = (2, 100);
pub const NRM_LENGTH: (usize, usize) = (5, 20);

/// Check if a string is not empty
pub fn not_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Check if a string length (in characters) is within bounds
pub fn length_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

/// Student name or NIM as typed on the login form
pub fn is_valid_namam_nim(value: &str) -> bool {
    let (min, max) = NAMAM_NIM_LENGTH;
    length_between(value, min, max) && NAMAM_NIM_PATTERN.is_match(value)
}

/// Registration number
pub fn is_valid_nrm(value: &str) -> bool {
    let (min, max) = NRM_LENGTH;
    length_between(value, min, max) && NRM_PATTERN.is_match(value)
}
