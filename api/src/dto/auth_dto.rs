use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};
use wh_core::domain::{AuthenticatedSubject, Student, TokenType};
use wh_shared::types::FieldError;
use wh_shared::validation;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Student number or full name
    #[serde(default)]
    #[validate(
        length(
            min = 2,
            max = 100,
            message = "Student name/NIM must be between 2 and 100 characters"
        ),
        custom(function = "namam_nim_characters")
    )]
    pub namam_nim: String,

    #[serde(default)]
    #[validate(
        length(min = 5, max = 20, message = "NRM must be between 5 and 20 characters"),
        custom(function = "nrm_characters")
    )]
    pub nrm: String,
}

impl LoginRequest {
    /// Trim both fields, as form input arrives with stray whitespace
    pub fn trimmed(self) -> Self {
        Self {
            namam_nim: self.namam_nim.trim().to_string(),
            nrm: self.nrm.trim().to_string(),
        }
    }
}

fn namam_nim_characters(value: &str) -> Result<(), ValidationError> {
    // Length is reported by its own rule
    if !in_length(value, validation::NAMAM_NIM_LENGTH) || validation::is_valid_namam_nim(value) {
        return Ok(());
    }
    Err(ValidationError::new("pattern").with_message(Cow::Borrowed(
        "Student name/NIM can only contain letters, numbers, spaces, dots, apostrophes, and hyphens",
    )))
}

fn nrm_characters(value: &str) -> Result<(), ValidationError> {
    if !in_length(value, validation::NRM_LENGTH) || validation::is_valid_nrm(value) {
        return Ok(());
    }
    Err(ValidationError::new("pattern").with_message(Cow::Borrowed(
        "NRM can only contain uppercase letters, numbers, and hyphens",
    )))
}

fn in_length(value: &str, (min, max): (usize, usize)) -> bool {
    validation::length_between(value, min, max)
}

/// Flatten validator output into `{field, message}` pairs, ordered by field
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                FieldError::new(field.to_string(), message)
            })
        })
        .collect()
}

/// Body of `POST /refresh`; browsers send the token as a cookie instead
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Profile fields returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub nrm: String,
    pub nim: String,
    pub namam: String,
    pub tgdaftar: Option<String>,
    pub tplahir: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Student> for StudentProfile {
    fn from(student: Student) -> Self {
        Self {
            nrm: student.nrm,
            nim: student.nim,
            namam: student.namam,
            tgdaftar: student.tgdaftar,
            tplahir: student.tplahir,
            email: student.email.filter(|e| !e.is_empty()),
            phone: student.phone.filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: StudentProfile,
    /// Only for clients that cannot read the HttpOnly cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub nrm: String,
    pub nim: String,
    pub namam: String,
    pub token_type: TokenType,
}

impl From<AuthenticatedSubject> for VerifyResponse {
    fn from(subject: AuthenticatedSubject) -> Self {
        Self {
            nrm: subject.nrm,
            nim: subject.nim,
            namam: subject.namam,
            token_type: subject.token_type,
        }
    }
}
